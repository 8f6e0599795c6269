// This module groups the time control domain components.
//
// Structure
// - state.rs: control record, aggregate and entity references
// - entries.rs: automatic timer segments and manual entries
// - status.rs: closed status enum translation to the external vocabulary
// - mutation.rs: storage mutations produced by the deciders
// - decider/: pure decision logic per command
// - reconcile.rs: live and recomputed totals

pub mod entries;
pub mod mutation;
pub mod reconcile;
pub mod state;
pub mod status;
pub mod decider {
    pub mod decision;
    pub mod create_control {
        pub mod command;
        pub mod decide;
    }
    pub mod start_timer {
        pub mod command;
        pub mod decide;
    }
    pub mod pause_timer {
        pub mod command;
        pub mod decide;
    }
    pub mod complete {
        pub mod command;
        pub mod decide;
    }
    pub mod reactivate {
        pub mod decide;
    }
    pub mod add_manual_time {
        pub mod command;
        pub mod decide;
    }
    pub mod delete_entry {
        pub mod command;
        pub mod decide;
    }
}
