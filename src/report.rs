//! Terminal rendering of a weekly plan.

use std::fmt;

use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};

use crate::optimize::{Decision, WeeklyPlan};

/// Day-by-day table plus the weekly summary.
pub struct PlanReport<'a> {
    plan: &'a WeeklyPlan,
}

impl<'a> PlanReport<'a> {
    pub fn new(plan: &'a WeeklyPlan) -> Self {
        Self { plan }
    }

    /// Builds the day table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Load\n(kWh)").add_attribute(Attribute::Bold),
            Cell::new("Solar\n(kWh)").add_attribute(Attribute::Bold),
            Cell::new("V2G avail.\n(kWh)").add_attribute(Attribute::Bold),
            Cell::new("Deficit\n(kWh)").add_attribute(Attribute::Bold),
            Cell::new("V2G cost").add_attribute(Attribute::Bold),
            Cell::new("Diesel cost").add_attribute(Attribute::Bold),
            Cell::new("Total cost").add_attribute(Attribute::Bold),
            Cell::new("Decision").add_attribute(Attribute::Bold),
        ]);

        for d in &self.plan.days {
            let color = match d.decision {
                Decision::UseV2g => Color::Green,
                Decision::UseDiesel => Color::Red,
                Decision::NoDeficit => Color::Cyan,
            };
            table.add_row(vec![
                Cell::new(d.date.format("%a %Y-%m-%d")),
                Cell::new(format!("{:.2}", d.load_forecast)),
                Cell::new(format!("{:.2}", d.solar_forecast)),
                Cell::new(format!("{:.2}", d.v2g_available_forecast)),
                Cell::new(format!("{:.2}", d.net_deficit)),
                Cell::new(format!("{:.2}", d.v2g_cost)),
                Cell::new(format!("{:.2}", d.diesel_cost)),
                Cell::new(format!("{:.2}", d.total_cost)),
                Cell::new(d.decision).fg(color),
            ]);
        }
        table
    }
}

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prices = &self.plan.prices;
        writeln!(
            f,
            "Prices: diesel {:.3}/kWh, V2G {:.3}/kWh",
            prices.diesel_price_per_kwh(),
            prices.v2g_price_per_kwh()
        )?;
        writeln!(f, "{}", self.table())?;
        write!(f, "\n{}", self.plan.summary)
    }
}
