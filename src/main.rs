use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use trendchat::session::{ChatSession, SessionEvent};
use trendchat::{AnalyticsClient, ChatClient, Config, HistoryStore, TimeRange};

#[derive(Parser)]
#[command(name = "trendchat")]
#[command(version)]
#[command(about = "Chat with the trend dashboard backend and browse its analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat,
    /// Ask a single question and print the streamed answer
    Ask { question: String },
    /// Show the popular-topics and hot-keyword rankings
    Trending,
    /// Show the topic-trend report for a time range
    Trends {
        /// Week starting date, YYYY-MM-DD (a Monday)
        #[arg(long, conflicts_with_all = ["quarter", "month"])]
        week: Option<chrono::NaiveDate>,
        /// Quarter 1-4
        #[arg(long, conflicts_with = "month")]
        quarter: Option<u32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
        /// Year (defaults to the current year; on its own selects the
        /// whole-year report)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Manage the local chat history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved chats, newest first
    List,
    /// Delete all saved chats
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        None | Some(Commands::Chat) => interactive_chat(&config).await,
        Some(Commands::Ask { question }) => ask_once(&config, &question).await,
        Some(Commands::Trending) => show_trending(&config).await,
        Some(Commands::Trends {
            week,
            quarter,
            month,
            year,
        }) => {
            let range = trend_range(week, quarter, month, year, Utc::now());
            show_trends(&config, range).await
        }
        Some(Commands::History { command }) => manage_history(&config, command),
    }
}

async fn interactive_chat(config: &Config) -> Result<()> {
    let mut history = HistoryStore::load(config.history_path())?;
    let chat_id = match history.active_chat() {
        Some(chat) => chat.id.clone(),
        None => history.create_chat()?,
    };

    let (mut session, mut events) = ChatSession::new(ChatClient::new(config));
    println!("💬 Connected to {} (Ctrl-D to quit)", config.base_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        session.submit(&line);
        if let Some(answer) = render_exchange(&mut events).await {
            history.touch(&chat_id, &answer)?;
        }
    }

    Ok(())
}

async fn ask_once(config: &Config, question: &str) -> Result<()> {
    let (mut session, mut events) = ChatSession::new(ChatClient::new(config));
    session.submit(question);
    render_exchange(&mut events).await;
    Ok(())
}

/// Print the streamed answer as it arrives. Shows a thinking indicator
/// until the first chunk lands, then the text itself is the progress.
/// Returns the full answer, or None when the exchange failed.
async fn render_exchange(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
) -> Option<String> {
    let mut answer = String::new();
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Thinking { .. } => {
                print!("⏳ thinking...");
                let _ = std::io::stdout().flush();
            }
            SessionEvent::Answering { .. } => {
                print!("\r              \rbot> ");
                let _ = std::io::stdout().flush();
            }
            SessionEvent::Delta { text, .. } => {
                answer.push_str(&text);
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            SessionEvent::Done { .. } => {
                println!();
                return Some(answer);
            }
            SessionEvent::Failed { .. } => {
                println!("\r🚫 {}", trendchat::ERROR_REPLY);
                return None;
            }
        }
    }
    None
}

async fn show_trending(config: &Config) -> Result<()> {
    let client = AnalyticsClient::new(config);
    let (today, week, month, keywords) = tokio::try_join!(
        client.popular_topics_today(),
        client.popular_topics_this_week(),
        client.popular_topics_this_month(),
        client.hot_keywords(),
    )?;

    for (title, topics) in [
        ("Popular today", today),
        ("Popular this week", week),
        ("Popular this month", month),
    ] {
        println!("📈 {title}:");
        for (rank, topic) in topics.iter().enumerate() {
            let growth = topic.growth.as_deref().unwrap_or("-");
            println!(
                "  {:>2}. {} [{}] {} ({} articles)",
                rank + 1,
                topic.topic,
                topic.category,
                growth,
                topic.articles
            );
        }
        println!();
    }

    println!("🔥 Hot keywords:");
    for (rank, keyword) in keywords.iter().enumerate() {
        println!("  {:>2}. {} ({})", rank + 1, keyword.text, keyword.value);
    }

    Ok(())
}

/// Map the trends flags to a query range. Week wins over quarter over
/// month; a bare --year selects the whole-year report; no flags means the
/// current month.
fn trend_range(
    week: Option<chrono::NaiveDate>,
    quarter: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
    now: chrono::DateTime<Utc>,
) -> TimeRange {
    if let Some(start) = week {
        TimeRange::Week { start }
    } else if let Some(quarter) = quarter {
        TimeRange::Quarter {
            quarter,
            year: year.unwrap_or(now.year()),
        }
    } else if let Some(month) = month {
        TimeRange::Month {
            month,
            year: year.unwrap_or(now.year()),
        }
    } else if let Some(year) = year {
        TimeRange::Year { year }
    } else {
        TimeRange::Month {
            month: now.month(),
            year: now.year(),
        }
    }
}

async fn show_trends(config: &Config, range: TimeRange) -> Result<()> {
    let report = AnalyticsClient::new(config).topic_trends(range).await?;
    println!(
        "📊 {} topics over {} data points",
        report.topics.len(),
        report.data.len()
    );
    for topic in &report.topics {
        print!("  {topic}");
        if let Some(keywords) = report.keywords.get(topic) {
            let top: Vec<&str> = keywords.iter().take(5).map(|k| k.text.as_str()).collect();
            print!(": {}", top.join(", "));
        }
        println!();
    }

    Ok(())
}

fn manage_history(config: &Config, command: HistoryCommands) -> Result<()> {
    let mut history = HistoryStore::load(config.history_path())?;
    match command {
        HistoryCommands::List => {
            if history.list().is_empty() {
                println!("📭 No saved chats yet.");
            }
            for chat in history.list() {
                let marker = if chat.active { "*" } else { " " };
                println!(
                    "{} {}  {}  {}",
                    marker,
                    chat.name,
                    chat.timestamp.format("%Y-%m-%d %H:%M"),
                    chat.last_message
                );
            }
        }
        HistoryCommands::Clear => {
            history.clear()?;
            println!("🗑️ Chat history cleared.");
        }
    }
    Ok(())
}
