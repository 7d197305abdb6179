use crate::collectors::{COLLECTOR_NAMES, Collector, all_factories};
use clap::{Arg, Command};

/// Flag names kept for compatibility with the older extended-metric switches.
const ALIASES: &[(&str, &str)] = &[
    ("innodb", "extended-innodb-metrics"),
    ("myisam", "extended-myisam-metrics"),
];

pub fn add_collectors_args(mut cmd: Command) -> Command {
    let factories = all_factories();

    for &name in COLLECTOR_NAMES {
        let Some(collector) = factories.get(name).map(|factory| factory()) else {
            continue;
        };

        // Required collectors cannot be toggled
        if collector.required() {
            continue;
        }

        let default_enabled = collector.enabled_by_default();

        let enable_flag: &'static str = Box::leak(format!("collector.{name}").into_boxed_str());
        let disable_flag: &'static str = Box::leak(format!("no-collector.{name}").into_boxed_str());

        let default_indicator = if default_enabled {
            " [default: enabled]"
        } else {
            " [default: disabled]"
        };
        let enable_help: &'static str =
            Box::leak(format!("Enable the {name} collector{default_indicator}").into_boxed_str());
        let disable_help: &'static str =
            Box::leak(format!("Disable the {name} collector").into_boxed_str());

        let mut enable = Arg::new(enable_flag)
            .long(enable_flag)
            .help(enable_help)
            .action(clap::ArgAction::SetTrue)
            .default_value(if default_enabled { "true" } else { "false" });

        for &(collector_name, alias) in ALIASES {
            if collector_name == name {
                enable = enable.alias(alias);
            }
        }

        cmd = cmd.arg(enable).arg(
            Arg::new(disable_flag)
                .long(disable_flag)
                .help(disable_help)
                .action(clap::ArgAction::SetTrue)
                .overrides_with(enable_flag),
        );
    }
    cmd
}
