use clap::{Parser, Subcommand};
use flowdw::{FlowDW, ImportBundle, Period, ReportRequest, ReportType};

#[derive(Parser)]
#[command(name = "flowdw", about = "Workflow analytics warehouse CLI")]
struct Cli {
    /// Database path (default: ~/.flowdw/flowdw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from the warehouse
    Report {
        /// Report type: summary, task-detail, delegation-analysis,
        /// performance, trends, benchmark
        report_type: String,
        /// Period (e.g. 2025-Q1, 2025-03, 2025-W05, 30d, ytd)
        #[arg(long, conflicts_with_all = ["start", "end"])]
        period: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Scope to a single task (required for task-detail)
        #[arg(long)]
        task: Option<String>,
        /// Filter by task owner
        #[arg(long)]
        owner: Option<String>,
        /// Filter by receiving role/mode
        #[arg(long)]
        mode: Option<String>,
        /// Filter by priority: low, medium, high, critical
        #[arg(long)]
        priority: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a record batch from a JSON file
    Import {
        /// Path to the export file
        file: String,
    },
    /// Show warehouse status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => flowdw::Database::open_at(path).await?,
        None => flowdw::Database::open().await?,
    };
    let dw = FlowDW::new(db);

    match cli.command {
        Commands::Report {
            report_type,
            period,
            start,
            end,
            task,
            owner,
            mode,
            priority,
            json,
        } => {
            let report_type: ReportType = report_type.parse()?;
            let mut request = ReportRequest::new(report_type);

            if let Some(period) = &period {
                let range = Period::parse(period)?.date_range();
                request.start_date = Some(range.start);
                request.end_date = Some(range.end);
            } else {
                request.start_date = parse_date(start.as_deref())?;
                request.end_date = parse_date(end.as_deref())?;
            }
            request.task_id = task;
            request.owner = owner;
            request.mode = mode;
            request.priority = priority.as_deref().map(str::parse).transpose()?;

            let report = dw.report(request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let bundle: ImportBundle = serde_json::from_str(&raw)?;
            let count = dw.import(bundle).await?;
            println!("Imported {count} records from {file}");
        }
        Commands::Status => {
            let counts = dw.status().await?;
            println!("Warehouse Status");
            for (table, count) in counts {
                println!("  {table:<18} {count}");
            }
        }
    }

    Ok(())
}

fn parse_date(raw: Option<&str>) -> anyhow::Result<Option<chrono::NaiveDate>> {
    raw.map(|s| {
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))
    })
    .transpose()
}

fn print_report(report: &flowdw::ReportData) {
    println!("{}", report.title);
    if let Some(range) = report.date_range {
        println!("  Period: {} to {}", range.start, range.end);
    }
    println!();

    let tasks = &report.metrics.tasks;
    if tasks.total_tasks > 0 {
        println!("Tasks");
        println!("  Total:           {}", tasks.total_tasks);
        println!("  Completed:       {}", tasks.completed_tasks);
        println!("  Completion rate: {:.1}%", tasks.completion_rate);
        println!(
            "  Avg completion:  {:.1}h",
            tasks.avg_completion_hours
        );
        println!();
    }

    let delegations = &report.metrics.delegations;
    if delegations.total_delegations > 0 {
        println!("Delegations");
        println!("  Total:      {}", delegations.total_delegations);
        println!("  Successful: {}", delegations.successful_delegations);
        println!("  Failed:     {}", delegations.failed_delegations);
        println!();
    }

    if report.flow.total_flows > 0 {
        println!("Flow");
        println!("  Efficiency score: {:.1}", report.flow.efficiency_score);
        if !report.flow.bottleneck_roles.is_empty() {
            println!(
                "  Bottlenecks:      {}",
                report.flow.bottleneck_roles.join(", ")
            );
        }
        println!();
    }

    if !report.benchmarks.is_empty() {
        println!("Benchmarks");
        for row in &report.benchmarks {
            println!(
                "  {:<28} {:>7.1} vs {:>7.1} ({:+.1}%, {})",
                row.metric, row.current_value, row.baseline_value, row.percent_delta, row.baseline
            );
        }
        println!();
    }

    if !report.trends.is_empty() {
        println!("Trends");
        for series in &report.trends {
            let values: Vec<String> = series
                .points
                .iter()
                .map(|p| format!("{:.0}", p.value))
                .collect();
            println!("  {:<26} {}", series.metric, values.join(" "));
        }
        println!();
    }

    println!("Recommendations");
    for line in &report.recommendations {
        println!("  - {line}");
    }

    if !report.degraded_groups.is_empty() {
        let names: Vec<&str> = report
            .degraded_groups
            .iter()
            .map(|g| g.as_str())
            .collect();
        println!();
        println!("Note: incomplete data for: {}", names.join(", "));
    }
}
