/*!
 * Monitoring
 * Structured tracing for the dispatcher
 */

mod tracer;

pub use tracer::{init_tracing, PassSpan};
