//! Chat progress port
//!
//! Defines the interface for reporting progress while a chat runs.

/// Callback for progress updates during a chat
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, live output, etc.).
/// Cycles are numbered from 1.
pub trait ChatObserver: Send + Sync {
    /// Called when a cycle starts
    fn on_cycle_start(&self, cycle: usize, total_cycles: usize, agents: &[String]);

    /// Called when one agent of a cycle finishes, successfully or not
    fn on_agent_complete(&self, cycle: usize, agent: &str, success: bool);

    /// Called when a cycle completes; `merged` is false if every agent failed
    fn on_cycle_complete(&self, cycle: usize, merged: bool);

    /// Called before an agent call is attempted again
    fn on_retry(&self, _agent: &str, _attempt: u32, _error: &str) {}

    // ==================== Final Stage Callbacks ====================

    /// Called when the final synthesis agent starts
    fn on_final_start(&self, _agent: &str) {}

    /// Called for each text chunk of the final answer, in arrival order
    fn on_output_delta(&self, _chunk: &str) {}

    /// Called when a streaming attempt failed after forwarding `discarded`.
    ///
    /// That text is not part of the answer; a retry streams again from the
    /// start of the same chunk.
    fn on_output_reset(&self, _discarded: &str) {}

    /// Called when the final agent finishes
    fn on_final_complete(&self, _success: bool) {}
}

/// No-op observer for when progress reporting is not needed
pub struct NoObserver;

impl ChatObserver for NoObserver {
    fn on_cycle_start(&self, _cycle: usize, _total_cycles: usize, _agents: &[String]) {}
    fn on_agent_complete(&self, _cycle: usize, _agent: &str, _success: bool) {}
    fn on_cycle_complete(&self, _cycle: usize, _merged: bool) {}
}
