use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};

use chrono::{TimeZone, Utc};
use entity::{Company, Contact, Deal, Stage};
use pipeline::{MoveId, NotificationId, NotificationSink, PipelineEngine};
use store::{
    CompanyDraft, CompanyStore, ContactDraft, ContactStore, DealDraft, DealStore, StoreError,
    StoreResult,
};

/// In-memory record store with per-call counters and scripted failures.
#[derive(Default)]
pub struct MemoryStore {
    deals: Mutex<Vec<Deal>>,
    contacts: Mutex<Vec<Contact>>,
    companies: Mutex<Vec<Company>>,
    next_id: AtomicI64,
    pub stage_calls: AtomicU64,
    fail_stage_updates: AtomicU32,
    fail_lists: AtomicBool,
}

impl MemoryStore {
    pub fn seeded(deals: Vec<Deal>, contacts: Vec<Contact>, companies: Vec<Company>) -> Self {
        let max_id = deals
            .iter()
            .map(|d| d.id)
            .chain(contacts.iter().map(|c| c.id))
            .chain(companies.iter().map(|c| c.id))
            .max()
            .unwrap_or(0);
        Self {
            deals: Mutex::new(deals),
            contacts: Mutex::new(contacts),
            companies: Mutex::new(companies),
            next_id: AtomicI64::new(max_id),
            ..Self::default()
        }
    }

    /// The next `update_stage` call fails with a 500.
    pub fn fail_next_stage_update(&self) {
        self.fail_stage_updates.fetch_add(1, Ordering::SeqCst);
    }

    /// The next `list_deals` call fails with a 500.
    pub fn fail_next_list(&self) {
        self.fail_lists.store(true, Ordering::SeqCst);
    }

    pub fn stored_deal(&self, id: i64) -> Option<Deal> {
        self.deals.lock().unwrap().iter().find(|d| d.id == id).cloned()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn scripted_stage_failure(&self) -> bool {
        self.fail_stage_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn rejected() -> StoreError {
        StoreError::Rejected {
            status: 500,
            message: "scripted failure".to_string(),
        }
    }
}

impl DealStore for MemoryStore {
    async fn list_deals(&self) -> StoreResult<Vec<Deal>> {
        if self.fail_lists.swap(false, Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(self.deals.lock().unwrap().clone())
    }

    async fn get_deal(&self, id: i64) -> StoreResult<Deal> {
        self.stored_deal(id)
            .ok_or(StoreError::NotFound { entity: "deal", id })
    }

    async fn create_deal(&self, draft: DealDraft) -> StoreResult<Deal> {
        let now = Utc::now();
        let deal = Deal {
            id: self.allocate_id(),
            title: draft.title,
            value_cents: draft.value_cents,
            stage: draft.stage,
            probability: draft.probability,
            contact_id: draft.contact_id,
            company_id: draft.company_id,
            expected_close: draft.expected_close,
            created_at: now,
            updated_at: now,
        };
        self.deals.lock().unwrap().push(deal.clone());
        Ok(deal)
    }

    async fn update_deal(&self, id: i64, draft: DealDraft) -> StoreResult<Deal> {
        let mut deals = self.deals.lock().unwrap();
        let deal = deals
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound { entity: "deal", id })?;
        deal.title = draft.title;
        deal.value_cents = draft.value_cents;
        deal.stage = draft.stage;
        deal.probability = draft.probability;
        deal.contact_id = draft.contact_id;
        deal.company_id = draft.company_id;
        deal.expected_close = draft.expected_close;
        deal.updated_at = Utc::now();
        Ok(deal.clone())
    }

    async fn delete_deal(&self, id: i64) -> StoreResult<()> {
        let mut deals = self.deals.lock().unwrap();
        let before = deals.len();
        deals.retain(|d| d.id != id);
        if deals.len() == before {
            return Err(StoreError::NotFound { entity: "deal", id });
        }
        Ok(())
    }

    async fn update_stage(&self, id: i64, stage: Stage) -> StoreResult<Deal> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        if self.scripted_stage_failure() {
            return Err(Self::rejected());
        }
        let mut deals = self.deals.lock().unwrap();
        let deal = deals
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(StoreError::NotFound { entity: "deal", id })?;
        deal.stage = stage;
        deal.updated_at = Utc::now();
        Ok(deal.clone())
    }
}

impl ContactStore for MemoryStore {
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Contact> {
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "contact",
                id,
            })
    }

    async fn create_contact(&self, draft: ContactDraft) -> StoreResult<Contact> {
        let now = Utc::now();
        let contact = Contact {
            id: self.allocate_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            company_id: draft.company_id,
            created_at: now,
            updated_at: now,
        };
        self.contacts.lock().unwrap().push(contact.clone());
        Ok(contact)
    }

    async fn update_contact(&self, id: i64, draft: ContactDraft) -> StoreResult<Contact> {
        let mut contacts = self.contacts.lock().unwrap();
        let contact = contacts.iter_mut().find(|c| c.id == id).ok_or(
            StoreError::NotFound {
                entity: "contact",
                id,
            },
        )?;
        contact.first_name = draft.first_name;
        contact.last_name = draft.last_name;
        contact.email = draft.email;
        contact.phone = draft.phone;
        contact.company_id = draft.company_id;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn delete_contact(&self, id: i64) -> StoreResult<()> {
        self.contacts.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

impl CompanyStore for MemoryStore {
    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        Ok(self.companies.lock().unwrap().clone())
    }

    async fn get_company(&self, id: i64) -> StoreResult<Company> {
        self.companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "company",
                id,
            })
    }

    async fn create_company(&self, draft: CompanyDraft) -> StoreResult<Company> {
        let now = Utc::now();
        let company = Company {
            id: self.allocate_id(),
            name: draft.name,
            industry: draft.industry,
            website: draft.website,
            phone: draft.phone,
            created_at: now,
            updated_at: now,
        };
        self.companies.lock().unwrap().push(company.clone());
        Ok(company)
    }

    async fn update_company(&self, id: i64, draft: CompanyDraft) -> StoreResult<Company> {
        let mut companies = self.companies.lock().unwrap();
        let company = companies.iter_mut().find(|c| c.id == id).ok_or(
            StoreError::NotFound {
                entity: "company",
                id,
            },
        )?;
        company.name = draft.name;
        company.industry = draft.industry;
        company.website = draft.website;
        company.phone = draft.phone;
        company.updated_at = Utc::now();
        Ok(company.clone())
    }

    async fn delete_company(&self, id: i64) -> StoreResult<()> {
        self.companies.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    Success {
        id: u64,
        message: String,
        undo: Option<MoveId>,
    },
    Failure {
        id: u64,
        message: String,
    },
    Dismissed(u64),
}

/// Captures every notification for assertions.
#[derive(Default)]
pub struct RecordingSink {
    last_id: AtomicU64,
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    fn next_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn success(&self, message: &str, undo: Option<MoveId>) -> NotificationId {
        let id = self.next_id();
        self.events.lock().unwrap().push(SinkEvent::Success {
            id,
            message: message.to_string(),
            undo,
        });
        NotificationId(id)
    }

    fn failure(&self, message: &str) -> NotificationId {
        let id = self.next_id();
        self.events.lock().unwrap().push(SinkEvent::Failure {
            id,
            message: message.to_string(),
        });
        NotificationId(id)
    }

    fn dismiss(&self, id: NotificationId) {
        self.events.lock().unwrap().push(SinkEvent::Dismissed(id.0));
    }
}

pub fn deal(id: i64, title: &str, stage: Stage, value_cents: i64) -> Deal {
    let created = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
    Deal {
        id,
        title: title.to_string(),
        value_cents,
        stage,
        probability: 25,
        contact_id: Some(1),
        company_id: Some(1),
        expected_close: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn seed_contacts() -> Vec<Contact> {
    let created = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
    vec![Contact {
        id: 1,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@acme.test".to_string(),
        phone: Some("+1-555-0110".to_string()),
        company_id: Some(1),
        created_at: created,
        updated_at: created,
    }]
}

pub fn seed_companies() -> Vec<Company> {
    let created = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
    vec![Company {
        id: 1,
        name: "ACME, Inc.".to_string(),
        industry: Some("Manufacturing".to_string()),
        website: Some("https://acme.test".to_string()),
        phone: None,
        created_at: created,
        updated_at: created,
    }]
}

/// Engine over a seeded in-memory store, working set already loaded.
pub async fn loaded_engine(deals: Vec<Deal>) -> PipelineEngine<MemoryStore, RecordingSink> {
    platform_obs::init_tracing("pipeline-tests").ok();
    let store = MemoryStore::seeded(deals, seed_contacts(), seed_companies());
    let mut engine = PipelineEngine::new(store, RecordingSink::default());
    engine.load().await.expect("seeded load");
    engine
}
