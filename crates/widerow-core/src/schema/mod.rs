pub mod reconcile;

pub use reconcile::{ReconcileAction, ReconcileError, ReconcileReport, SchemaReconciler};
