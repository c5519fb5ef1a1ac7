//! Cross-crate flows. Each module runs real subsystems wired the way the
//! node runtime wires them, with in-memory backends unless a test needs
//! the disk.

#[cfg(test)]
mod desync_recovery;
#[cfg(test)]
mod fork_choice;
#[cfg(test)]
mod gossip_flow;
#[cfg(test)]
mod persistence;
#[cfg(test)]
mod submission_flow;
