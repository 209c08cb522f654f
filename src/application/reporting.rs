use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, EarnerRank, EmployeeFilter, EmployeeSummary, EnrichedSale, PeriodSelection,
    TimeRange, Totals, compute_totals, employee_names,
};

/// Output of one aggregation pass. Replaced wholesale on every pass; an
/// empty pass is what a failed read produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPass {
    pub selection: Option<PeriodSelection>,
    pub range: Option<TimeRange>,
    /// Every sale in the period, ascending by creation time
    pub sales: Vec<EnrichedSale>,
    pub top_earners: Vec<EarnerRank>,
    pub summary: Vec<EmployeeSummary>,
}

impl AccountingPass {
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.top_earners.is_empty() && self.summary.is_empty()
    }

    /// Project the pass through an employee filter. A named filter shows
    /// only that employee's rows and suppresses the ranking and summary.
    pub fn report(&self, filter: &EmployeeFilter) -> AccountingReport {
        let sales: Vec<EnrichedSale> = self
            .sales
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        let totals = compute_totals(&sales);

        let (top_earners, summary) = match filter {
            EmployeeFilter::All => (self.top_earners.clone(), self.summary.clone()),
            EmployeeFilter::Named(_) => (Vec::new(), Vec::new()),
        };

        AccountingReport {
            selection: self.selection,
            filter: filter.clone(),
            employees: employee_names(&self.sales),
            sales,
            totals,
            top_earners,
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingReport {
    pub selection: Option<PeriodSelection>,
    pub filter: EmployeeFilter,
    /// Names available for filtering, from the unfiltered pass
    pub employees: Vec<String>,
    pub sales: Vec<EnrichedSale>,
    pub totals: Totals,
    pub top_earners: Vec<EarnerRank>,
    pub summary: Vec<EmployeeSummary>,
}

/// Employee names grouped by current availability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBoard {
    pub available: Vec<String>,
    pub at_lunch: Vec<String>,
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub status: StatusBoard,
    pub revenue_today: Amount,
    pub revenue_month: Amount,
    pub monthly_ranking: Vec<EarnerRank>,
    pub employee_of_the_month: Option<EarnerRank>,
}
