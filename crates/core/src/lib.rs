pub mod activity;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod format;
pub mod notifications;
pub mod session;
pub mod stats;
pub mod store;
pub mod tasks;
pub mod view;

pub use activity::{ActivityEntry, ActivityOutcome, ActivitySink, InMemoryActivitySink};
pub use domain::{
    Agreement, AgreementId, AgreementStatus, Invoice, InvoiceId, InvoiceStatus, PurchaseOrder,
    PurchaseOrderId, PurchaseOrderStatus, RecordStatus, WorkflowStep,
};
pub use errors::{ApplicationError, DomainError, EntityKind, InterfaceError};
pub use format::{format_currency, format_short_date, Locale};
pub use notifications::{
    Clock, ManualClock, Notification, NotificationId, NotificationQueue, SystemClock, Tone,
};
pub use session::{Modal, ModalOutcome, PortalSession, SessionSettings};
pub use stats::PortalStats;
pub use store::{InvoiceNumbering, PortalStore};
pub use tasks::{derive_tasks, PendingTask, TaskKind};
pub use view::{
    derive_view, Page, RecordRow, RowAction, SortDirection, SortKey, SortSpec, StatusFilter,
    ViewQuery,
};
