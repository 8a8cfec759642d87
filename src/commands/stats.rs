use super::open_db;
use crate::db::statistics::Statistics;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::msg_print;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Days in the daily completion chart
    #[arg(long)]
    days: Option<usize>,
    /// Weeks in the weekly completion chart
    #[arg(long)]
    weeks: Option<usize>,
    /// Months in the monthly completion chart
    #[arg(long)]
    months: Option<usize>,
}

pub fn cmd(args: StatsArgs) -> Result<()> {
    let db = open_db()?;
    let stats_config = Config::read()?.stats;
    let stats = Statistics::new(&db);

    msg_print!(Message::OverallStatsHeader, true);
    View::overview(&stats.overall_stats()?, &stats.reflection_stats()?)?;

    msg_print!(Message::DistributionHeader, true);
    View::distribution(&stats.task_distribution()?)?;

    let daily = stats.daily_completion_rate(args.days.unwrap_or(stats_config.daily_days))?;
    msg_print!(Message::CompletionRateHeader("daily".to_string()), true);
    View::completion_rates(&daily)?;

    let weekly = stats.weekly_completion_rate(args.weeks.unwrap_or(stats_config.weekly_weeks))?;
    msg_print!(Message::CompletionRateHeader("weekly".to_string()), true);
    View::completion_rates(&weekly)?;

    let monthly = stats.monthly_completion_rate(args.months.unwrap_or(stats_config.monthly_months))?;
    msg_print!(Message::CompletionRateHeader("monthly".to_string()), true);
    View::completion_rates(&monthly)
}
