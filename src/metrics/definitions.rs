//! The static table of known raw keys.
//!
//! Keys the server reports that are not listed here are dropped. Adding a
//! metric means adding a row; nothing is inferred at runtime.

use super::{
    AttributeDefinition, DerivedDefinition, Group, Kind, MetricDefinition, RawSample, Transform,
};

const MS_TO_SECONDS: Transform = Transform::Scale(0.001);

const fn gauge(
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    group: Group,
) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        kind: Kind::Gauge,
        unit,
        transform: Transform::Identity,
        group,
    }
}

const fn flag(key: &'static str, name: &'static str, group: Group) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        kind: Kind::Gauge,
        unit: "boolean",
        transform: Transform::Boolean,
        group,
    }
}

const fn rate(
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    group: Group,
) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        kind: Kind::Rate,
        unit,
        transform: Transform::Identity,
        group,
    }
}

const fn delta(
    key: &'static str,
    name: &'static str,
    unit: &'static str,
    group: Group,
) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        kind: Kind::Delta,
        unit,
        transform: Transform::Identity,
        group,
    }
}

const fn scaled(mut def: MetricDefinition, transform: Transform) -> MetricDefinition {
    def.transform = transform;
    def
}

pub const METRIC_DEFINITIONS: &[MetricDefinition] = &[
    // Connections and network
    rate("Aborted_clients", "net.abortedClientsPerSecond", "connections/s", Group::Core),
    rate("Aborted_connects", "net.abortedConnectsPerSecond", "connections/s", Group::Core),
    rate("Bytes_received", "net.bytesReceivedPerSecond", "bytes/s", Group::Core),
    rate("Bytes_sent", "net.bytesSentPerSecond", "bytes/s", Group::Core),
    rate(
        "Connection_errors_max_connections",
        "net.connectionErrorsMaxConnectionsPerSecond",
        "errors/s",
        Group::Core,
    ),
    rate("Connections", "net.connectionsPerSecond", "connections/s", Group::Core),
    gauge("Max_used_connections", "net.maxUsedConnections", "connections", Group::Core),
    gauge("max_connections", "net.maxConnections", "connections", Group::Core),
    gauge("Threads_connected", "net.threadsConnected", "threads", Group::Core),
    gauge("Threads_running", "net.threadsRunning", "threads", Group::Core),
    // Statements
    rate("Com_commit", "query.comCommitPerSecond", "statements/s", Group::Core),
    rate("Com_delete", "query.comDeletePerSecond", "statements/s", Group::Core),
    rate("Com_delete_multi", "query.comDeleteMultiPerSecond", "statements/s", Group::Core),
    rate("Com_insert", "query.comInsertPerSecond", "statements/s", Group::Core),
    rate("Com_insert_select", "query.comInsertSelectPerSecond", "statements/s", Group::Core),
    rate("Com_replace_select", "query.comReplaceSelectPerSecond", "statements/s", Group::Core),
    rate("Com_rollback", "query.comRollbackPerSecond", "statements/s", Group::Core),
    rate("Com_select", "query.comSelectPerSecond", "statements/s", Group::Core),
    rate("Com_update", "query.comUpdatePerSecond", "statements/s", Group::Core),
    rate("Com_update_multi", "query.comUpdateMultiPerSecond", "statements/s", Group::Core),
    gauge("Prepared_stmt_count", "query.preparedStmtCount", "statements", Group::Core),
    rate("Queries", "query.queriesPerSecond", "queries/s", Group::Core),
    rate("Questions", "query.questionsPerSecond", "queries/s", Group::Core),
    rate("Slow_queries", "query.slowQueriesPerSecond", "queries/s", Group::Core),
    // Tables, files and caches
    rate("Handler_rollback", "db.handlerRollbackPerSecond", "operations/s", Group::Core),
    gauge("Open_files", "db.openFiles", "files", Group::Core),
    gauge("Open_tables", "db.openTables", "tables", Group::Core),
    rate("Opened_tables", "db.openedTablesPerSecond", "tables/s", Group::Core),
    rate("Table_locks_waited", "db.tablesLocksWaitedPerSecond", "locks/s", Group::Core),
    gauge("Qcache_free_memory", "db.qCacheFreeMemoryBytes", "bytes", Group::Core),
    rate("Qcache_not_cached", "db.qCacheNotCachedPerSecond", "queries/s", Group::Core),
    gauge("query_cache_size", "db.qCacheSizeBytes", "bytes", Group::Core),
    gauge("Uptime", "db.uptimeSeconds", "seconds", Group::Core),
    flag("read_only", "db.readOnly", Group::Core),
    flag("Slave_running", "cluster.slaveRunning", Group::Core),
    // Extended: handler, temporary objects, selects and sorts
    delta("Binlog_cache_disk_use", "db.binlogCacheDiskUse", "transactions", Group::Extended),
    delta("Binlog_cache_use", "db.binlogCacheUse", "transactions", Group::Extended),
    delta("Created_tmp_disk_tables", "db.createdTmpDiskTables", "tables", Group::Extended),
    delta("Created_tmp_files", "db.createdTmpFiles", "files", Group::Extended),
    delta("Created_tmp_tables", "db.createdTmpTables", "tables", Group::Extended),
    rate("Handler_delete", "db.handlerDeletePerSecond", "operations/s", Group::Extended),
    rate("Handler_read_first", "db.handlerReadFirstPerSecond", "operations/s", Group::Extended),
    rate("Handler_read_key", "db.handlerReadKeyPerSecond", "operations/s", Group::Extended),
    rate("Handler_read_next", "db.handlerReadNextPerSecond", "operations/s", Group::Extended),
    rate("Handler_read_prev", "db.handlerReadPrevPerSecond", "operations/s", Group::Extended),
    rate("Handler_read_rnd", "db.handlerReadRndPerSecond", "operations/s", Group::Extended),
    rate(
        "Handler_read_rnd_next",
        "db.handlerReadRndNextPerSecond",
        "operations/s",
        Group::Extended,
    ),
    rate("Handler_update", "db.handlerUpdatePerSecond", "operations/s", Group::Extended),
    rate("Handler_write", "db.handlerWritePerSecond", "operations/s", Group::Extended),
    delta("Select_full_join", "query.selectFullJoin", "queries", Group::Extended),
    delta("Select_full_range_join", "query.selectFullJoinRange", "queries", Group::Extended),
    delta("Select_range", "query.selectRange", "queries", Group::Extended),
    delta("Select_range_check", "query.selectRangeCheck", "queries", Group::Extended),
    delta("Select_scan", "query.selectScan", "queries", Group::Extended),
    delta("Sort_merge_passes", "query.sortMergePasses", "passes", Group::Extended),
    delta("Sort_range", "query.sortRange", "sorts", Group::Extended),
    delta("Sort_rows", "query.sortRows", "rows", Group::Extended),
    delta("Sort_scan", "query.sortScan", "sorts", Group::Extended),
    rate("Table_locks_immediate", "db.tablesLocksImmediatePerSecond", "locks/s", Group::Extended),
    rate("Table_open_cache_hits", "db.tableOpenCacheHitsPerSecond", "lookups/s", Group::Extended),
    rate(
        "Table_open_cache_misses",
        "db.tableOpenCacheMissesPerSecond",
        "lookups/s",
        Group::Extended,
    ),
    gauge("Threads_cached", "db.threadsCached", "threads", Group::Extended),
    rate("Threads_created", "db.threadsCreatedPerSecond", "threads/s", Group::Extended),
    flag("have_ssl", "db.sslAvailable", Group::Extended),
    flag("performance_schema", "db.performanceSchemaEnabled", Group::Extended),
    // InnoDB buffer pool
    gauge("Innodb_buffer_pool_bytes_data", "db.innodb.bufferPoolDataBytes", "bytes", Group::Innodb),
    gauge(
        "Innodb_buffer_pool_bytes_dirty",
        "db.innodb.bufferPoolDirtyBytes",
        "bytes",
        Group::Innodb,
    ),
    gauge("Innodb_buffer_pool_pages_data", "db.innodb.bufferPoolPagesData", "pages", Group::Innodb),
    gauge(
        "Innodb_buffer_pool_pages_dirty",
        "db.innodb.bufferPoolPagesDirty",
        "pages",
        Group::Innodb,
    ),
    gauge("Innodb_buffer_pool_pages_free", "db.innodb.bufferPoolPagesFree", "pages", Group::Innodb),
    gauge("Innodb_buffer_pool_pages_misc", "db.innodb.bufferPoolPagesMisc", "pages", Group::Innodb),
    gauge(
        "Innodb_buffer_pool_pages_total",
        "db.innodb.bufferPoolPagesTotal",
        "pages",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_pages_flushed",
        "db.innodb.bufferPoolPagesFlushedPerSecond",
        "pages/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_read_ahead",
        "db.innodb.bufferPoolReadAheadPerSecond",
        "pages/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_read_ahead_evicted",
        "db.innodb.bufferPoolReadAheadEvictedPerSecond",
        "pages/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_read_requests",
        "db.innodb.bufferPoolReadRequestsPerSecond",
        "requests/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_reads",
        "db.innodb.bufferPoolReadsPerSecond",
        "reads/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_wait_free",
        "db.innodb.bufferPoolWaitFreePerSecond",
        "waits/s",
        Group::Innodb,
    ),
    rate(
        "Innodb_buffer_pool_write_requests",
        "db.innodb.bufferPoolWriteRequestsPerSecond",
        "requests/s",
        Group::Innodb,
    ),
    gauge("innodb_buffer_pool_size", "db.innodb.bufferPoolSizeBytes", "bytes", Group::Innodb),
    // InnoDB data and log I/O
    gauge("Innodb_data_pending_fsyncs", "db.innodb.dataPendingFsyncs", "operations", Group::Innodb),
    gauge("Innodb_data_pending_reads", "db.innodb.dataPendingReads", "operations", Group::Innodb),
    gauge("Innodb_data_pending_writes", "db.innodb.dataPendingWrites", "operations", Group::Innodb),
    rate("Innodb_data_fsyncs", "db.innodb.dataFsyncsPerSecond", "operations/s", Group::Innodb),
    rate("Innodb_data_read", "db.innodb.dataReadBytesPerSecond", "bytes/s", Group::Innodb),
    rate("Innodb_data_reads", "db.innodb.dataReadsPerSecond", "operations/s", Group::Innodb),
    rate("Innodb_data_writes", "db.innodb.dataWritesPerSecond", "operations/s", Group::Innodb),
    rate("Innodb_data_written", "db.innodb.dataWrittenBytesPerSecond", "bytes/s", Group::Innodb),
    rate("Innodb_log_waits", "db.innodb.logWaitsPerSecond", "waits/s", Group::Innodb),
    rate(
        "Innodb_log_write_requests",
        "db.innodb.logWriteRequestsPerSecond",
        "requests/s",
        Group::Innodb,
    ),
    rate("Innodb_log_writes", "db.innodb.logWritesPerSecond", "writes/s", Group::Innodb),
    rate("Innodb_os_log_fsyncs", "db.innodb.osLogFsyncsPerSecond", "operations/s", Group::Innodb),
    gauge(
        "Innodb_os_log_pending_fsyncs",
        "db.innodb.osLogPendingFsyncs",
        "operations",
        Group::Innodb,
    ),
    gauge(
        "Innodb_os_log_pending_writes",
        "db.innodb.osLogPendingWrites",
        "operations",
        Group::Innodb,
    ),
    rate("Innodb_os_log_written", "db.innodb.osLogWrittenBytesPerSecond", "bytes/s", Group::Innodb),
    rate("Innodb_pages_created", "db.innodb.pagesCreatedPerSecond", "pages/s", Group::Innodb),
    rate("Innodb_pages_read", "db.innodb.pagesReadPerSecond", "pages/s", Group::Innodb),
    rate("Innodb_pages_written", "db.innodb.pagesWrittenPerSecond", "pages/s", Group::Innodb),
    // InnoDB rows and locks
    rate("Innodb_rows_deleted", "db.innodb.rowsDeletedPerSecond", "rows/s", Group::Innodb),
    rate("Innodb_rows_inserted", "db.innodb.rowsInsertedPerSecond", "rows/s", Group::Innodb),
    rate("Innodb_rows_read", "db.innodb.rowsReadPerSecond", "rows/s", Group::Innodb),
    rate("Innodb_rows_updated", "db.innodb.rowsUpdatedPerSecond", "rows/s", Group::Innodb),
    gauge("Innodb_row_lock_current_waits", "db.innodb.rowLockCurrentWaits", "waits", Group::Innodb),
    scaled(
        delta("Innodb_row_lock_time", "db.innodb.rowLockTimeSeconds", "seconds", Group::Innodb),
        MS_TO_SECONDS,
    ),
    scaled(
        gauge(
            "Innodb_row_lock_time_avg",
            "db.innodb.rowLockTimeAvgSeconds",
            "seconds",
            Group::Innodb,
        ),
        MS_TO_SECONDS,
    ),
    scaled(
        gauge(
            "Innodb_row_lock_time_max",
            "db.innodb.rowLockTimeMaxSeconds",
            "seconds",
            Group::Innodb,
        ),
        MS_TO_SECONDS,
    ),
    rate("Innodb_row_lock_waits", "db.innodb.rowLockWaitsPerSecond", "waits/s", Group::Innodb),
    delta("Innodb_deadlocks", "db.innodb.deadlocks", "deadlocks", Group::Innodb),
    // InnoDB engine status (parsed from SHOW ENGINE INNODB STATUS)
    gauge("Innodb_lsn_current", "db.innodb.lsnCurrent", "bytes", Group::Innodb),
    gauge("Innodb_lsn_flushed", "db.innodb.lsnFlushed", "bytes", Group::Innodb),
    gauge("Innodb_lsn_last_checkpoint", "db.innodb.lsnLastCheckpoint", "bytes", Group::Innodb),
    gauge("Innodb_checkpoint_age", "db.innodb.checkpointAgeBytes", "bytes", Group::Innodb),
    gauge(
        "Innodb_active_transactions",
        "db.innodb.activeTransactions",
        "transactions",
        Group::Innodb,
    ),
    rate(
        "Innodb_semaphore_os_waits",
        "db.innodb.semaphoreOsWaitsPerSecond",
        "waits/s",
        Group::Innodb,
    ),
    gauge(
        "Innodb_hash_searches_per_second",
        "db.innodb.adaptiveHashSearchesPerSecond",
        "searches/s",
        Group::Innodb,
    ),
    gauge(
        "Innodb_non_hash_searches_per_second",
        "db.innodb.nonHashSearchesPerSecond",
        "searches/s",
        Group::Innodb,
    ),
    // MyISAM key cache
    gauge("Key_blocks_not_flushed", "db.myisam.keyBlocksNotFlushed", "blocks", Group::Myisam),
    gauge("Key_blocks_unused", "db.myisam.keyBlocksUnused", "blocks", Group::Myisam),
    gauge("Key_blocks_used", "db.myisam.keyBlocksUsed", "blocks", Group::Myisam),
    rate("Key_read_requests", "db.myisam.keyReadRequestsPerSecond", "requests/s", Group::Myisam),
    rate("Key_reads", "db.myisam.keyReadsPerSecond", "reads/s", Group::Myisam),
    rate("Key_write_requests", "db.myisam.keyWriteRequestsPerSecond", "requests/s", Group::Myisam),
    rate("Key_writes", "db.myisam.keyWritesPerSecond", "writes/s", Group::Myisam),
    gauge("key_buffer_size", "db.myisam.keyBufferSizeBytes", "bytes", Group::Myisam),
    // Replication (SHOW SLAVE STATUS columns)
    gauge("Seconds_Behind_Master", "cluster.secondsBehindMaster", "seconds", Group::Replication),
    flag("Slave_IO_Running", "cluster.slaveIORunning", Group::Replication),
    flag("Slave_SQL_Running", "cluster.slaveSQLRunning", Group::Replication),
    gauge("Read_Master_Log_Pos", "cluster.masterLogPosition", "bytes", Group::Replication),
    gauge("Exec_Master_Log_Pos", "cluster.executedMasterLogPosition", "bytes", Group::Replication),
    gauge("Relay_Log_Pos", "cluster.relayLogPosition", "bytes", Group::Replication),
    gauge("Relay_Log_Space", "cluster.relayLogSpaceBytes", "bytes", Group::Replication),
    gauge("Last_IO_Errno", "cluster.lastIOErrorNumber", "errno", Group::Replication),
    gauge("Last_SQL_Errno", "cluster.lastSQLErrorNumber", "errno", Group::Replication),
];

pub const ATTRIBUTE_DEFINITIONS: &[AttributeDefinition] = &[
    AttributeDefinition {
        key: "version",
        name: "software.version",
        group: Group::Core,
    },
    AttributeDefinition {
        key: "version_comment",
        name: "software.edition",
        group: Group::Core,
    },
    AttributeDefinition {
        key: "node_type",
        name: "cluster.nodeType",
        group: Group::Replication,
    },
];

#[must_use]
pub fn metric_definitions() -> Vec<MetricDefinition> {
    METRIC_DEFINITIONS.to_vec()
}

#[must_use]
pub fn attribute_definitions() -> Vec<AttributeDefinition> {
    ATTRIBUTE_DEFINITIONS.to_vec()
}

#[must_use]
pub fn derived_definitions() -> Vec<DerivedDefinition> {
    vec![
        DerivedDefinition {
            name: "db.qCacheHitRatio",
            unit: "ratio",
            group: Group::Core,
            compute: query_cache_hit_ratio,
        },
        DerivedDefinition {
            name: "db.qCacheUtilization",
            unit: "ratio",
            group: Group::Core,
            compute: query_cache_utilization,
        },
        DerivedDefinition {
            name: "db.threadCacheMissRate",
            unit: "ratio",
            group: Group::Core,
            compute: thread_cache_miss_rate,
        },
        DerivedDefinition {
            name: "db.innodb.bufferPoolUtilization",
            unit: "ratio",
            group: Group::Innodb,
            compute: innodb_buffer_pool_utilization,
        },
        DerivedDefinition {
            name: "db.myisam.keyCacheUtilization",
            unit: "ratio",
            group: Group::Myisam,
            compute: key_cache_utilization,
        },
    ]
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

fn query_cache_hit_ratio(raw: &RawSample) -> Option<f64> {
    let hits = raw.number("Qcache_hits")?;
    let selects = raw.number("Com_select")?;
    ratio(hits, hits + selects)
}

fn query_cache_utilization(raw: &RawSample) -> Option<f64> {
    let free = raw.number("Qcache_free_blocks")?;
    let total = raw.number("Qcache_total_blocks")?;
    ratio(free, total).map(|r| 1.0 - r)
}

fn thread_cache_miss_rate(raw: &RawSample) -> Option<f64> {
    let created = raw.number("Threads_created")?;
    let connections = raw.number("Connections")?;
    ratio(created, connections)
}

fn innodb_buffer_pool_utilization(raw: &RawSample) -> Option<f64> {
    let free = raw.number("Innodb_buffer_pool_pages_free")?;
    let total = raw.number("Innodb_buffer_pool_pages_total")?;
    ratio(free, total).map(|r| 1.0 - r)
}

fn key_cache_utilization(raw: &RawSample) -> Option<f64> {
    let unused = raw.number("Key_blocks_unused")?;
    let block_size = raw.number("key_cache_block_size")?;
    let buffer_size = raw.number("key_buffer_size")?;
    ratio(unused * block_size, buffer_size).map(|r| 1.0 - r)
}
