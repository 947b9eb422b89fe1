//! Contract for the external record store that owns the durable copy of
//! every CRM record, plus an HTTP implementation of it.
//!
//! The engine only ever mutates deals through `update_stage`; the rest of
//! the CRUD surface backs the surrounding application's forms.

// The traits are only consumed through generic bounds, never as trait
// objects, so plain `async fn` signatures are fine here.
#![allow(async_fn_in_trait)]

use chrono::NaiveDate;
use entity::{Company, Contact, Deal, Stage};
use serde::{Deserialize, Serialize};

pub mod config;
mod error;
pub mod http;

pub use config::StoreConfig;
pub use error::StoreError;
pub use http::HttpRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Create/replace payload for a deal. Ids and timestamps are assigned by
/// the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDraft {
    pub title: String,
    pub value_cents: i64,
    pub stage: Stage,
    pub probability: i16,
    pub contact_id: Option<i64>,
    pub company_id: Option<i64>,
    pub expected_close: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDraft {
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

pub trait DealStore {
    async fn list_deals(&self) -> StoreResult<Vec<Deal>>;
    async fn get_deal(&self, id: i64) -> StoreResult<Deal>;
    async fn create_deal(&self, draft: DealDraft) -> StoreResult<Deal>;
    async fn update_deal(&self, id: i64, draft: DealDraft) -> StoreResult<Deal>;
    async fn delete_deal(&self, id: i64) -> StoreResult<()>;
    /// Single-field stage persistence; cheaper than a full `update_deal`
    /// and the only mutation the pipeline engine issues.
    async fn update_stage(&self, id: i64, stage: Stage) -> StoreResult<Deal>;
}

pub trait ContactStore {
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn get_contact(&self, id: i64) -> StoreResult<Contact>;
    async fn create_contact(&self, draft: ContactDraft) -> StoreResult<Contact>;
    async fn update_contact(&self, id: i64, draft: ContactDraft) -> StoreResult<Contact>;
    async fn delete_contact(&self, id: i64) -> StoreResult<()>;
}

pub trait CompanyStore {
    async fn list_companies(&self) -> StoreResult<Vec<Company>>;
    async fn get_company(&self, id: i64) -> StoreResult<Company>;
    async fn create_company(&self, draft: CompanyDraft) -> StoreResult<Company>;
    async fn update_company(&self, id: i64, draft: CompanyDraft) -> StoreResult<Company>;
    async fn delete_company(&self, id: i64) -> StoreResult<()>;
}
