//! Human-friendly output.

use std::collections::BTreeMap;

use outlook_core::{
    ClassificationVerdict, DailyEstimate, Variable, VariableForecast, stats::DayOfMonthStats,
};
use serde::Serialize;

const NO_DATA: &str = "no data";

fn opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| NO_DATA.to_string())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|p| format!("{:.0}%", p * 100.0))
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn daily_table(variable: Variable, estimates: &[DailyEstimate]) {
    println!("{:<12} {:>10} {:>8} {:>8}", "date", "mean", "p", "samples");
    for e in estimates {
        println!(
            "{:<12} {:>10} {:>8} {:>8}",
            e.date.to_string(),
            opt(e.mean, 2),
            percent(e.probability),
            e.samples
        );
    }
    if !variable.unit().is_empty() {
        println!("(mean in {})", variable.unit());
    }
}

pub fn daily(result: &BTreeMap<Variable, Option<Vec<DailyEstimate>>>) {
    for (variable, estimates) in result {
        println!("== {variable}");
        match estimates {
            Some(estimates) => daily_table(*variable, estimates),
            None => println!("unavailable"),
        }
        println!();
    }
}

pub fn forecast(result: &BTreeMap<Variable, Option<VariableForecast>>) {
    for (variable, forecast) in result {
        println!("== {variable}");
        let Some(forecast) = forecast else {
            println!("unavailable\n");
            continue;
        };

        daily_table(*variable, &forecast.daily);

        println!();
        println!("{:<12} {:>12} {:>12} {:>12}", "month", "trend", "climatology", "combined");
        for p in &forecast.monthly.forecast.points {
            println!(
                "{:<12} {:>12} {:>12.2} {:>12}",
                p.date.to_string(),
                opt(p.trend, 2),
                p.climatology,
                opt(p.combined, 2)
            );
        }
        println!(
            "({} historical months)\n",
            forecast.monthly.history.len()
        );
    }
}

pub fn verdict(verdict: &ClassificationVerdict) {
    println!("{}: {}", verdict.date, verdict.overall);
    println!();
    println!("{}", verdict.summary);
    println!();

    let width = verdict
        .details
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0);
    for (key, value) in &verdict.details {
        println!("{key:<width$}  {value}");
    }
}

pub fn day_stats(result: &BTreeMap<u32, BTreeMap<Variable, DayOfMonthStats>>) {
    for (day, per_variable) in result {
        println!("== day {day}");
        if per_variable.is_empty() {
            println!("no data");
        }
        for (variable, s) in per_variable {
            println!(
                "{:<14} n={:<5} mean={:<8.2} min={:<8.2} max={:.2}",
                variable.as_str(),
                s.count,
                s.mean,
                s.min,
                s.max
            );
        }
        println!();
    }
}
