use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Amount, EmployeeDirectory, Sale};

/// Number of entries kept in the top earners ranking.
pub const TOP_EARNERS: usize = 3;

/// A sale with its employee's display name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedSale {
    #[serde(flatten)]
    pub sale: Sale,
    pub employee_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnerRank {
    pub name: String,
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub name: String,
    /// Number of sales
    pub sales: i64,
    /// Sum of the employee's share
    pub earned: Amount,
    /// Sum of full prices
    pub generated: Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub revenue: Amount,
    pub employees: Amount,
    pub shop: Amount,
}

/// Which rows of a pass to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeFilter {
    #[default]
    All,
    Named(String),
}

impl EmployeeFilter {
    pub fn from_option(name: Option<String>) -> Self {
        match name {
            Some(name) => EmployeeFilter::Named(name),
            None => EmployeeFilter::All,
        }
    }

    pub fn matches(&self, sale: &EnrichedSale) -> bool {
        match self {
            EmployeeFilter::All => true,
            EmployeeFilter::Named(name) => sale.employee_name == *name,
        }
    }
}

/// Attach display names to sales.
pub fn enrich(sales: Vec<Sale>, directory: &EmployeeDirectory) -> Vec<EnrichedSale> {
    sales
        .into_iter()
        .map(|sale| {
            let employee_name = directory.resolve(sale.employee_id).to_string();
            EnrichedSale {
                sale,
                employee_name,
            }
        })
        .collect()
}

/// Accumulate per-name values in first-seen order.
fn group_by_name<T, F>(sales: &[EnrichedSale], init: impl Fn(&str) -> T, mut fold: F) -> Vec<T>
where
    F: FnMut(&mut T, &EnrichedSale),
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<T> = Vec::new();

    for sale in sales {
        let slot = *index.entry(sale.employee_name.as_str()).or_insert_with(|| {
            groups.push(init(&sale.employee_name));
            groups.len() - 1
        });
        fold(&mut groups[slot], sale);
    }

    groups
}

/// Employees ranked by revenue generated, highest first, at most
/// [`TOP_EARNERS`] entries. Equal totals keep first-seen order.
pub fn rank_top_earners(sales: &[EnrichedSale]) -> Vec<EarnerRank> {
    let mut ranking = rank_all_earners(sales);
    ranking.truncate(TOP_EARNERS);
    ranking
}

/// Every employee ranked by revenue generated, highest first.
pub fn rank_all_earners(sales: &[EnrichedSale]) -> Vec<EarnerRank> {
    let mut ranking = group_by_name(
        sales,
        |name| EarnerRank {
            name: name.to_string(),
            total: 0,
        },
        |rank, sale| rank.total += sale.sale.price,
    );
    ranking.sort_by(|a, b| b.total.cmp(&a.total));
    ranking
}

/// Per-employee counts and amounts, sorted by amount earned, highest first.
pub fn summarize_by_employee(sales: &[EnrichedSale]) -> Vec<EmployeeSummary> {
    let mut summary = group_by_name(
        sales,
        |name| EmployeeSummary {
            name: name.to_string(),
            sales: 0,
            earned: 0,
            generated: 0,
        },
        |entry, sale| {
            entry.sales += 1;
            entry.earned += sale.sale.employee_amount;
            entry.generated += sale.sale.price;
        },
    );
    summary.sort_by(|a, b| b.earned.cmp(&a.earned));
    summary
}

pub fn compute_totals<'a>(sales: impl IntoIterator<Item = &'a EnrichedSale>) -> Totals {
    sales.into_iter().fold(Totals::default(), |mut totals, s| {
        totals.revenue += s.sale.price;
        totals.employees += s.sale.employee_amount;
        totals.shop += s.sale.shop_amount;
        totals
    })
}

/// Sorted, distinct employee names present in the rows.
pub fn employee_names(sales: &[EnrichedSale]) -> Vec<String> {
    let mut names: Vec<String> = sales.iter().map(|s| s.employee_name.clone()).collect();
    names.sort();
    names.dedup();
    names
}
