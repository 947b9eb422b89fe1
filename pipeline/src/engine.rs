use chrono::Utc;
use entity::{Company, Contact, Deal, Stage};
use store::{CompanyStore, ContactStore, DealStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use crate::history::{MoveHistory, MoveId, MoveRecord};
use crate::notify::NotificationSink;
use crate::stage::transition_allowed;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("another stage move is still in flight")]
    Busy,
    #[error("a deal cannot move from {from} to {to}")]
    IllegalTransition { from: Stage, to: Stage },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The engine serializes persistence: while one move or undo is in
/// flight it is `Moving` and rejects further mutation attempts. Reads
/// stay available and observe the optimistic state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineState {
    Idle,
    Moving { deal_id: i64 },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MoveOutcome {
    /// Persisted and recorded in history under this id.
    Moved(MoveId),
    /// Same-stage request or a deal id outside the working set; nothing
    /// happened and nothing was notified.
    Ignored,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UndoOutcome {
    Undone,
    /// The move was already undone, aged out of history, or its deal is
    /// gone from the working set.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub count: usize,
    pub value_cents: i64,
}

#[derive(Clone, Debug)]
pub struct StageColumn {
    pub stage: Stage,
    pub count: usize,
    pub value_cents: i64,
    pub deals: Vec<Deal>,
}

#[derive(Clone, Debug)]
pub struct Board {
    pub columns: Vec<StageColumn>,
    pub count: usize,
    pub value_cents: i64,
}

/// Client-side owner of the deal working set. All mutation goes through
/// `load`, `request_move`, and `undo`; the presentation layer only reads.
pub struct PipelineEngine<S, N> {
    store: S,
    sink: N,
    deals: Vec<Deal>,
    contacts: Vec<Contact>,
    companies: Vec<Company>,
    history: MoveHistory,
    state: EngineState,
}

impl<S, N> PipelineEngine<S, N>
where
    S: DealStore + ContactStore + CompanyStore,
    N: NotificationSink,
{
    pub fn new(store: S, sink: N) -> Self {
        Self {
            store,
            sink,
            deals: Vec::new(),
            contacts: Vec::new(),
            companies: Vec::new(),
            history: MoveHistory::new(),
            state: EngineState::Idle,
        }
    }

    /// Replace the working set with the store's current snapshot,
    /// including the contact/company records the board joins against.
    /// On failure the previous working set is left untouched so the
    /// caller can retry.
    pub async fn load(&mut self) -> Result<(), EngineError> {
        let (deals, contacts, companies) = tokio::try_join!(
            self.store.list_deals(),
            self.store.list_contacts(),
            self.store.list_companies(),
        )?;
        info!(
            target: "pipeline",
            deals = deals.len(),
            contacts = contacts.len(),
            companies = companies.len(),
            "working set loaded"
        );
        self.deals = deals;
        self.contacts = contacts;
        self.companies = companies;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Deals currently in `stage`, in working-set order.
    pub fn deals_in_stage(&self, stage: Stage) -> Vec<&Deal> {
        self.deals.iter().filter(|d| d.stage == stage).collect()
    }

    /// Count and value total for one column, recomputed on demand.
    pub fn stage_summary(&self, stage: Stage) -> StageSummary {
        let mut count = 0;
        let mut value_cents = 0;
        for deal in self.deals.iter().filter(|d| d.stage == stage) {
            count += 1;
            value_cents += deal.value_cents;
        }
        StageSummary {
            stage,
            count,
            value_cents,
        }
    }

    /// All six columns in pipeline order, with grand totals.
    pub fn board(&self) -> Board {
        let columns: Vec<StageColumn> = Stage::ORDER
            .iter()
            .map(|&stage| {
                let deals: Vec<Deal> = self
                    .deals
                    .iter()
                    .filter(|d| d.stage == stage)
                    .cloned()
                    .collect();
                let value_cents = deals.iter().map(|d| d.value_cents).sum();
                StageColumn {
                    stage,
                    count: deals.len(),
                    value_cents,
                    deals,
                }
            })
            .collect();
        let count = columns.iter().map(|c| c.count).sum();
        let value_cents = columns.iter().map(|c| c.value_cents).sum();
        Board {
            columns,
            count,
            value_cents,
        }
    }

    pub fn contact_name(&self, contact_id: Option<i64>) -> String {
        contact_id
            .and_then(|id| self.contacts.iter().find(|c| c.id == id))
            .map(Contact::display_name)
            .unwrap_or_else(|| "Unknown Contact".to_string())
    }

    pub fn company_name(&self, company_id: Option<i64>) -> String {
        company_id
            .and_then(|id| self.companies.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unknown Company".to_string())
    }

    /// Move one deal to `dest`: validate, apply optimistically, persist,
    /// and record the move for undo. On persistence failure the working
    /// set is restored to its pre-move state.
    pub async fn request_move(
        &mut self,
        deal_id: i64,
        dest: Stage,
    ) -> Result<MoveOutcome, EngineError> {
        self.ensure_idle()?;
        let Some(idx) = self.deals.iter().position(|d| d.id == deal_id) else {
            warn!(target: "pipeline", deal_id, "move requested for a deal outside the working set");
            return Ok(MoveOutcome::Ignored);
        };
        let from = self.deals[idx].stage;
        if from == dest {
            return Ok(MoveOutcome::Ignored);
        }
        if !transition_allowed(from, dest) {
            let title = &self.deals[idx].title;
            self.sink
                .failure(&format!("\"{title}\" cannot move from {from} to {dest}"));
            return Err(EngineError::IllegalTransition { from, to: dest });
        }
        match self.persist_stage(idx, dest).await {
            Ok(()) => {
                let title = self.deals[idx].title.clone();
                let move_id = self.history.allocate_id();
                let notification = self
                    .sink
                    .success(&format!("Moved \"{title}\" to {dest}"), Some(move_id));
                self.history.push(MoveRecord {
                    id: move_id,
                    deal_id,
                    deal_title: title,
                    from,
                    to: dest,
                    at: Utc::now(),
                    notification,
                });
                info!(target: "pipeline", deal_id, %from, %dest, "stage move persisted");
                Ok(MoveOutcome::Moved(move_id))
            }
            Err(err) => {
                let title = &self.deals[idx].title;
                self.sink
                    .failure(&format!("Failed to move \"{title}\": {err}"));
                Err(err.into())
            }
        }
    }

    /// Revert a recorded move, with the same optimistic-apply and
    /// rollback-on-failure discipline as `request_move`. Unknown or
    /// aged-out ids are a silent no-op.
    pub async fn undo(&mut self, move_id: MoveId) -> Result<UndoOutcome, EngineError> {
        self.ensure_idle()?;
        let Some(record) = self.history.take(move_id) else {
            return Ok(UndoOutcome::Expired);
        };
        let Some(idx) = self.deals.iter().position(|d| d.id == record.deal_id) else {
            warn!(
                target: "pipeline",
                deal_id = record.deal_id,
                "undo target has left the working set"
            );
            return Ok(UndoOutcome::Expired);
        };
        let target = record.from;
        match self.persist_stage(idx, target).await {
            Ok(()) => {
                let title = self.deals[idx].title.clone();
                self.sink.dismiss(record.notification);
                self.sink
                    .success(&format!("Moved \"{title}\" back to {target}"), None);
                info!(
                    target: "pipeline",
                    deal_id = record.deal_id,
                    stage = %target,
                    "stage move undone"
                );
                Ok(UndoOutcome::Undone)
            }
            Err(err) => {
                let title = &self.deals[idx].title;
                self.sink
                    .failure(&format!("Failed to undo the move of \"{title}\": {err}"));
                // The move still stands; keep it undoable.
                self.history.restore(record);
                Err(err.into())
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Idle => Ok(()),
            EngineState::Moving { .. } => Err(EngineError::Busy),
        }
    }

    /// Snapshot, mutate, persist, then adopt the store's record or
    /// revert to the snapshot. The single suspension point; `Moving`
    /// is held across it.
    async fn persist_stage(&mut self, idx: usize, target: Stage) -> Result<(), StoreError> {
        let snapshot = self.deals[idx].clone();
        self.deals[idx].stage = target;
        self.deals[idx].updated_at = Utc::now();
        self.state = EngineState::Moving {
            deal_id: snapshot.id,
        };
        let result = self.store.update_stage(snapshot.id, target).await;
        self.state = EngineState::Idle;
        match result {
            Ok(stored) => {
                self.deals[idx] = stored;
                Ok(())
            }
            Err(err) => {
                self.deals[idx] = snapshot;
                Err(err)
            }
        }
    }
}
