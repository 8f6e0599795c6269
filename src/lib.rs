pub mod core {
    pub mod control;
    pub mod duration;
    pub mod ports;
}

pub mod application {
    pub mod command_handlers {
        pub mod control_handler;
    }
    pub mod query_handlers {
        pub mod control_queries;
    }
    pub mod errors;
    pub mod live_total;
}

pub mod adapters {
    pub mod clock;
    pub mod in_memory {
        pub mod in_memory_control_store;
        pub mod in_memory_status_vocabulary;
        pub mod in_memory_tracked_entities;
    }
    pub mod inbound {
        pub mod graphql;
        pub mod http;
    }
}

pub mod shell;
