use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::{
    Employee, EmployeeDirectory, PeriodSelection, Sale, SourceQuery, enrich, rank_top_earners,
    summarize_by_employee,
};
use crate::storage::{ChangeEvent, Repository};

use super::AccountingPass;

/// Read access to the two sale partitions and the employee table.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Sales of one partition, ascending by creation time.
    async fn sales(&self, query: &SourceQuery) -> Result<Vec<Sale>>;

    async fn employees(&self) -> Result<Vec<Employee>>;
}

#[async_trait]
impl LedgerSource for Repository {
    async fn sales(&self, query: &SourceQuery) -> Result<Vec<Sale>> {
        self.list_sales(query.partition, query.range).await
    }

    async fn employees(&self) -> Result<Vec<Employee>> {
        self.list_employees().await
    }
}

/// Runs aggregation passes over a [`LedgerSource`]. Never writes.
pub struct Accountant<S> {
    source: S,
}

impl<S: LedgerSource> Accountant<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Aggregate the selected period. Any read failure is logged and yields
    /// an empty pass, never partial totals.
    pub async fn run<Tz: TimeZone>(
        &self,
        selection: PeriodSelection,
        today: NaiveDate,
        tz: &Tz,
    ) -> AccountingPass {
        match self.try_run(selection, today, tz).await {
            Ok(pass) => pass,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    date = %selection.date,
                    mode = %selection.mode,
                    "Accounting pass failed"
                );
                AccountingPass::default()
            }
        }
    }

    async fn try_run<Tz: TimeZone>(
        &self,
        selection: PeriodSelection,
        today: NaiveDate,
        tz: &Tz,
    ) -> Result<AccountingPass> {
        let range = selection.range_in(tz)?;
        let plan = selection.source_plan(today, range);
        tracing::debug!(?plan, %today, "Resolved source plan");

        let directory = EmployeeDirectory::from_employees(self.source.employees().await?);

        let mut sales = Vec::new();
        for query in &plan.queries {
            sales.extend(self.source.sales(query).await?);
        }
        if plan.needs_merge_sort() {
            sales.sort_by_key(|s| s.created_at);
        }

        let sales = enrich(sales, &directory);
        tracing::info!(
            date = %selection.date,
            mode = %selection.mode,
            sales = sales.len(),
            "Accounting pass complete"
        );

        Ok(AccountingPass {
            selection: Some(selection),
            range: Some(range),
            top_earners: rank_top_earners(&sales),
            summary: summarize_by_employee(&sales),
            sales,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardState {
    /// Nothing requested yet
    Idle,
    Loading,
    Ready(AccountingPass),
}

impl BoardState {
    pub fn pass(&self) -> Option<&AccountingPass> {
        match self {
            BoardState::Ready(pass) => Some(pass),
            _ => None,
        }
    }
}

/// Source of the current instant; "today" is derived in the board's zone.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Holds the latest aggregation output for one view. A newer request
/// supersedes an in-flight one; the output is only ever replaced whole.
pub struct AccountingBoard<S, Tz> {
    accountant: Accountant<S>,
    tz: Tz,
    clock: Clock,
    generation: AtomicU64,
    latest: watch::Sender<Option<PeriodSelection>>,
    state: watch::Sender<BoardState>,
}

impl<S: LedgerSource, Tz: TimeZone> AccountingBoard<S, Tz> {
    pub fn new(accountant: Accountant<S>, tz: Tz) -> Self {
        Self::with_clock(accountant, tz, Arc::new(Utc::now))
    }

    pub fn with_clock(accountant: Accountant<S>, tz: Tz, clock: Clock) -> Self {
        let (latest, _) = watch::channel(None);
        let (state, _) = watch::channel(BoardState::Idle);
        Self {
            accountant,
            tz,
            clock,
            generation: AtomicU64::new(0),
            latest,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BoardState {
        self.state.borrow().clone()
    }

    pub fn last_request(&self) -> Option<PeriodSelection> {
        *self.latest.borrow()
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)().with_timezone(&self.tz).date_naive()
    }

    /// Run a pass for `selection`. Returns false when a newer request
    /// started meanwhile and this pass was discarded.
    pub async fn request(&self, selection: PeriodSelection) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.send_replace(Some(selection));
        self.state.send_replace(BoardState::Loading);

        let pass = self.accountant.run(selection, self.today(), &self.tz).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::warn!(
                date = %selection.date,
                mode = %selection.mode,
                "Discarding superseded accounting pass"
            );
            return false;
        }

        self.state.send_replace(BoardState::Ready(pass));
        true
    }

    /// Re-run the last request, if any.
    pub async fn refresh(&self) -> bool {
        match self.last_request() {
            Some(selection) => self.request(selection).await,
            None => false,
        }
    }
}

/// Re-runs the board's last request on every change event until dropped.
pub struct RefreshSubscription {
    handle: JoinHandle<()>,
}

impl RefreshSubscription {
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Wire a change feed to a board. The board stays unaware of the feed.
pub fn refresh_on_change<S, Tz>(
    board: Arc<AccountingBoard<S, Tz>>,
    mut changes: broadcast::Receiver<ChangeEvent>,
) -> RefreshSubscription
where
    S: LedgerSource + 'static,
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    let handle = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => {
                    tracing::debug!(table = ?event.table, "Change received, refreshing accounting");
                    board.refresh().await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change feed lagged, refreshing accounting");
                    board.refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    RefreshSubscription { handle }
}
