//! End-of-run report.

use crate::RunMode;
use redblue_core::LogRecord;
use redblue_simulation::Snapshot;
use serde::Serialize;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub seed: u64,
    pub mode: RunMode,
    pub snapshot: Snapshot,
    /// Most recent log records, oldest first.
    pub history: Vec<LogRecord>,
}

impl SimulationReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Print the log followed by a human-readable summary.
    pub fn print(&self) {
        println!("\n=== Simulation Log ===");
        for record in &self.history {
            println!("{record}");
        }
        self.print_summary();
    }

    pub fn print_summary(&self) {
        let stats = &self.snapshot.stats;
        let state = &self.snapshot.state;

        println!("\n=== Simulation Summary ===");
        println!("Scenario: {} (seed {}, {:?})", self.scenario, self.seed, self.mode);
        println!("Logical time: {:.3}s", self.snapshot.time.as_secs_f64());
        println!(
            "Events processed: {} ({} still pending)",
            stats.events_processed, self.snapshot.pending_events
        );
        println!(
            "Actions: {} succeeded, {} failed, {} prerequisites unmet, {} faulted",
            stats.actions_succeeded,
            stats.actions_failed,
            stats.prerequisites_unmet,
            stats.actions_faulted
        );
        if stats.actions_attempted() > 0 {
            println!("Success rate: {:.1}%", stats.success_rate() * 100.0);
        }
        if stats.clock_skews > 0 || stats.lookup_misses > 0 {
            println!(
                "Warnings: {} clock skews, {} lookup misses",
                stats.clock_skews, stats.lookup_misses
            );
        }

        println!("\nNodes:");
        for node in state.nodes() {
            match node.compromising_actor() {
                Some(actor) => println!("  {:<26} {:?} (by {actor})", node.id, node.status()),
                None => println!("  {:<26} {:?}", node.id, node.status()),
            }
        }

        println!("\nActors:");
        for actor in state.actors() {
            println!(
                "  {:<26} {:?}, {} AP, knows {} nodes",
                actor.id,
                actor.team,
                actor.action_points,
                actor.knowledge.len()
            );
        }

        let blocked: Vec<&str> = state.blocked_ips().map(String::as_str).collect();
        if !blocked.is_empty() {
            println!("\nBlocked IPs: {}", blocked.join(", "));
        }
    }
}
