use chrono::{Datelike, NaiveDate};
use quit_habit::{
    DayStatus, HabitStore, HabitSummary, HabitTracker, MemoryHabitStore, MonthCalendar, NewHabit,
    SqliteHabitStore, UpsertOutcome, load_snapshot_from_json, restore_snapshot,
    save_records_to_csv, save_snapshot_to_json, snapshot_store, validation,
};
use std::io::{self, Write};
use std::str::SplitWhitespace;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  list                               List habits with streaks\n  add <start|-> <name...>            Create a habit (start YYYY-MM-DD, '-' for today)\n  show <id>                          Show one habit\n  delete <id>                        Delete a habit and all its records\n  fail <id> <YYYY-MM-DD> <reason...> Mark a day as failed (rewrites reason if already marked)\n  reason <record_id> <text...>       Change the reason of a failure record\n  unfail <record_id>                 Delete a failure record\n  records <id>                       List failure records of a habit\n  calendar <id> [year month]         Render a month (default: current month)\n  export json <path>                 Write all habits and records to a JSON file\n  import json <path>                 Load habits and records from a JSON file\n  export csv <id> <path>             Write a habit's records to a CSV file\n  quit|exit                          Exit"
    );
}

fn print_summary(summary: &HabitSummary) {
    let habit = &summary.habit;
    let last_fail = summary
        .last_fail_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "#{:<4} {:<24} since {}  streak {:>4} day(s)  last fail {}",
        habit.id, habit.name, habit.start_date, summary.consecutive_days, last_fail
    );
    if let Some(description) = &habit.description {
        println!("      {}", description);
    }
}

fn status_marker(status: DayStatus) -> char {
    match status {
        DayStatus::Success => '.',
        DayStatus::Fail => 'x',
        DayStatus::NotStarted => '-',
        DayStatus::Future => ' ',
    }
}

fn render_calendar(calendar: &MonthCalendar) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {:04}-{:02}\n",
        calendar.habit.name, calendar.year, calendar.month
    ));
    out.push_str(" Mo  Tu  We  Th  Fr  Sa  Su\n");

    let offset = calendar
        .days
        .first()
        .map(|day| day.date.weekday().num_days_from_monday() as usize)
        .unwrap_or(0);
    let mut column = 0;
    for _ in 0..offset {
        out.push_str("    ");
        column += 1;
    }
    for day in &calendar.days {
        out.push_str(&format!("{:>3}{}", day.day, status_marker(day.status)));
        column += 1;
        if column == 7 {
            out.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        out.push('\n');
    }
    out.push_str("(. success  x fail  - not started  blank future)\n");

    for day in calendar
        .days
        .iter()
        .filter(|day| day.status == DayStatus::Fail)
    {
        let reason = day.reason.as_deref().unwrap_or("");
        let record = day
            .record_id
            .map(|id| format!(" [record {id}]"))
            .unwrap_or_default();
        out.push_str(&format!("  {}: {}{}\n", day.date, reason, record));
    }
    out
}

fn rest_of_line(parts: SplitWhitespace<'_>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.parse::<i64>().ok())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    validation::parse_date("date", value).ok()
}

fn open_store() -> Result<Arc<dyn HabitStore>, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let store = SqliteHabitStore::new(&path)?;
            println!("Using database {path}");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryHabitStore::new())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(quit_habit::config::LOG_VAR)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let tracker = HabitTracker::new(open_store()?);

    println!("Quit Habit (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "list" => match tracker.list_habits() {
                Ok(habits) if habits.is_empty() => println!("No habits yet."),
                Ok(habits) => habits.iter().for_each(print_summary),
                Err(e) => println!("Error: {}", e),
            },
            "add" => {
                let start_s = parts.next();
                let name = rest_of_line(parts);
                let Some(start_s) = start_s else {
                    println!("Usage: add <start|-> <name...>");
                    continue;
                };
                let mut input = NewHabit::new(name);
                if start_s != "-" {
                    match parse_date(start_s) {
                        Some(date) => input = input.starting(date),
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    }
                }
                match tracker.create_habit(input) {
                    Ok(habit) => println!(
                        "Created habit {} '{}' starting {}.",
                        habit.id, habit.name, habit.start_date
                    ),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "show" => match parse_id(parts.next()) {
                Some(id) => match tracker.habit_summary(id) {
                    Ok(summary) => print_summary(&summary),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: show <id>"),
            },
            "delete" => match parse_id(parts.next()) {
                Some(id) => match tracker.delete_habit(id) {
                    Ok(()) => println!("Deleted habit {id}."),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: delete <id>"),
            },
            "fail" => {
                let id = parse_id(parts.next());
                let date_s = parts.next();
                let reason = rest_of_line(parts);
                let (Some(id), Some(date_s)) = (id, date_s) else {
                    println!("Usage: fail <id> <YYYY-MM-DD> <reason...>");
                    continue;
                };
                let Some(date) = parse_date(date_s) else {
                    println!("Invalid date (YYYY-MM-DD)");
                    continue;
                };
                match tracker.mark_fail(id, date, &reason) {
                    Ok((record, UpsertOutcome::Created)) => {
                        println!("Recorded failure {} on {}.", record.id, record.date)
                    }
                    Ok((record, UpsertOutcome::Updated)) => {
                        println!("Updated failure {} on {}.", record.id, record.date)
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "reason" => {
                let id = parse_id(parts.next());
                let reason = rest_of_line(parts);
                match id {
                    Some(id) => match tracker.update_record_reason(id, &reason) {
                        Ok(record) => println!("Updated reason of record {}.", record.id),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: reason <record_id> <text...>"),
                }
            }
            "unfail" => match parse_id(parts.next()) {
                Some(id) => match tracker.delete_record(id) {
                    Ok(()) => println!("Deleted record {id}."),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: unfail <record_id>"),
            },
            "records" => match parse_id(parts.next()) {
                Some(id) => match tracker.records(id) {
                    Ok(records) if records.is_empty() => println!("No failures recorded."),
                    Ok(records) => {
                        for record in records {
                            println!("  [{}] {}  {}", record.id, record.date, record.reason);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: records <id>"),
            },
            "calendar" => {
                let id = parse_id(parts.next());
                let year = parts.next().and_then(|v| v.parse::<i32>().ok());
                let month = parts.next().and_then(|v| v.parse::<u32>().ok());
                match id {
                    Some(id) => match tracker.calendar(id, year, month) {
                        Ok(calendar) => print!("{}", render_calendar(&calendar)),
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Usage: calendar <id> [year month]"),
                }
            }
            "export" => match (parts.next(), parts.next(), parts.next()) {
                (Some("json"), Some(path), None) => {
                    match snapshot_store(tracker.store())
                        .and_then(|snapshot| save_snapshot_to_json(&snapshot, path))
                    {
                        Ok(()) => println!("Exported habits to {path}."),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                (Some("csv"), Some(id_s), Some(path)) => match parse_id(Some(id_s)) {
                    Some(id) => match tracker.records(id) {
                        Ok(records) => match save_records_to_csv(&records, path) {
                            Ok(()) => println!("Exported {} record(s) to {path}.", records.len()),
                            Err(e) => println!("Error: {}", e),
                        },
                        Err(e) => println!("Error: {}", e),
                    },
                    None => println!("Invalid id"),
                },
                _ => println!("Usage: export json <path> | export csv <id> <path>"),
            },
            "import" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => {
                    let today = tracker.today();
                    match load_snapshot_from_json(path)
                        .and_then(|snapshot| restore_snapshot(tracker.store(), &snapshot, today))
                    {
                        Ok(habits) => println!("Imported {} habit(s) from {path}.", habits.len()),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: import json <path>"),
            },
            _ => println!("Unknown command '{}'. Type 'help'.", cmd),
        }
    }
    Ok(())
}
