pub mod run;

use crate::integration::Settings;

#[derive(Debug)]
pub enum Action {
    Run(Box<Settings>),
}
