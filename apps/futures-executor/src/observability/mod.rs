//! Observability: metric recording helpers.

pub mod metrics;

pub use metrics::{
    record_gateway_request, record_gateway_retry, record_order_submission, record_workflow_run,
    update_open_orders,
};
