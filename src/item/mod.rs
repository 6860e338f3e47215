/// CSV roster reader producing one `UserRecord` per row.
pub mod roster;

/// Writer that logs row outcomes and builds the run summary.
pub mod report;
