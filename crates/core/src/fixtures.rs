//! Demo dataset the portal boots with. Everything lives in memory and is
//! rebuilt on every start.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    Agreement, AgreementId, AgreementStatus, Invoice, InvoiceId, InvoiceStatus, PurchaseOrder,
    PurchaseOrderId, PurchaseOrderStatus,
};

pub const SEED_VENDOR_ID: &str = "VND-88219";
pub const SEED_TAX_ID: &str = "01.234.567.8-091.000";
pub const SEED_HEAD_OFFICE: &str = "Jaya Building 12th Floor, Jakarta";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn agreement(
    id: &str,
    title: &str,
    end_date: NaiveDate,
    status: AgreementStatus,
    value: u64,
) -> Agreement {
    Agreement { id: AgreementId(id.to_string()), title: title.to_string(), end_date, status, value }
}

fn order(
    id: &str,
    agreement_id: &str,
    item: &str,
    amount: u64,
    status: PurchaseOrderStatus,
    issued_on: NaiveDate,
) -> PurchaseOrder {
    PurchaseOrder {
        id: PurchaseOrderId(id.to_string()),
        agreement_id: AgreementId(agreement_id.to_string()),
        item: item.to_string(),
        amount,
        status,
        issued_on,
    }
}

pub fn seed_agreements() -> Vec<Agreement> {
    vec![
        agreement(
            "AGR-CPO-001",
            "CPO Haulage Contract Riau-North Sumatra",
            date(2025, 12, 1),
            AgreementStatus::Active,
            1_500_000_000,
        ),
        agreement(
            "AGR-PUP-012",
            "Non-Subsidised NPK Fertiliser Supply 2024",
            date(2025, 6, 15),
            AgreementStatus::Active,
            2_400_000_000,
        ),
        agreement(
            "AGR-SW-005",
            "Tanker Truck Lease, 20 KL Capacity",
            date(2025, 5, 20),
            AgreementStatus::AwaitingVendorSignature,
            500_000_000,
        ),
        agreement(
            "AGR-MN-099",
            "Excavator Maintenance CAT X-200",
            date(2024, 12, 15),
            AgreementStatus::Expired,
            120_000_000,
        ),
        agreement(
            "AGR-BIB-044",
            "Premium DxP Oil Palm Seedling Procurement",
            date(2025, 8, 30),
            AgreementStatus::Active,
            750_000_000,
        ),
    ]
}

pub fn seed_purchase_orders() -> Vec<PurchaseOrder> {
    vec![
        order(
            "PO-2024-001",
            "AGR-CPO-001",
            "CPO Shipment Batch 1 (Sei Lala)",
            125_000_000,
            PurchaseOrderStatus::New,
            date(2025, 1, 1),
        ),
        order(
            "PO-2024-002",
            "AGR-PUP-012",
            "Granular NPK Fertiliser 150 Tons",
            825_000_000,
            PurchaseOrderStatus::Completed,
            date(2024, 12, 10),
        ),
        order(
            "PO-2024-003",
            "AGR-CPO-001",
            "Additional Truck Rental (Emergency)",
            45_000_000,
            PurchaseOrderStatus::Confirmed,
            date(2024, 12, 28),
        ),
        order(
            "PO-2024-004",
            "AGR-BIB-044",
            "Simalungun Palm Seedlings, 5000 Trees",
            350_000_000,
            PurchaseOrderStatus::New,
            date(2025, 1, 2),
        ),
        order(
            "PO-2024-005",
            "AGR-PUP-012",
            "German KCL Fertiliser 50 Tons",
            275_000_000,
            PurchaseOrderStatus::Completed,
            date(2024, 11, 20),
        ),
    ]
}

pub fn seed_invoices() -> Vec<Invoice> {
    vec![
        Invoice {
            id: InvoiceId("INV-24-901".to_string()),
            purchase_order_id: PurchaseOrderId("PO-2024-002".to_string()),
            amount: 825_000_000,
            status: InvoiceStatus::Paid,
            issued_on: date(2024, 12, 20),
            pay_date: "2024-12-25".to_string(),
        },
        Invoice {
            id: InvoiceId("INV-24-905".to_string()),
            purchase_order_id: PurchaseOrderId("PO-2024-003".to_string()),
            amount: 45_000_000,
            status: InvoiceStatus::Processing,
            issued_on: date(2025, 1, 1),
            pay_date: "Estimate: 15 Jan 2025".to_string(),
        },
    ]
}

/// Upstream events shown on the dashboard feed before the vendor acts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedActivity {
    pub source: &'static str,
    pub message: &'static str,
    pub when: &'static str,
}

pub fn seed_activity() -> Vec<SeedActivity> {
    vec![
        SeedActivity {
            source: "Finance",
            message: "Funds for INV-24-901 released to the bank transfer queue",
            when: "10 minutes ago",
        },
        SeedActivity {
            source: "Warehouse",
            message: "Goods receipt issued for PO-2024-002",
            when: "2 hours ago",
        },
        SeedActivity {
            source: "Legal",
            message: "A new contract draft is available for review",
            when: "Today",
        },
    ]
}
