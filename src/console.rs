//! Line-oriented front end: parses console input into session intents and
//! renders views as text.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};

use crate::favorites::FavoritesStore;
use crate::filters::{PriceFilter, ResultFilters};
use crate::model::{Course, TrendingSearch};
use crate::session::view::ViewState;
use crate::util::truncate_chars;

const TITLE_WIDTH: usize = 60;

pub const HELP: &str = "\
Type to edit the query (an empty line clears it). Commands:
  :go               search for the current query
  :pick N           search for suggestion N
  :fix              accept the spelling correction
  :hide             hide suggestions
  :retry            retry a failed search
  :next / :prev     catalog paging (empty query only)
  :page N           jump to catalog page N
  :platform NAME    toggle a platform filter
  :category NAME    filter by category (or 'all')
  :price all|free|paid
  :rating N         minimum rating (or 'any')
  :nofilter         clear all filters
  :fav ID           toggle a favorite
  :favs             list favorites
  :trending         most searched keywords
  :help             show this help
  :quit             exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Type(String),
    Submit,
    Pick(usize),
    AcceptCorrection,
    Hide,
    Retry,
    Next,
    Prev,
    Page(u32),
    TogglePlatform(String),
    Category(Option<String>),
    Price(PriceFilter),
    MinRating(Option<f32>),
    ClearFilters,
    ToggleFavorite(String),
    ListFavorites,
    Trending,
    Help,
    Quit,
}

/// Parse one input line. Lines not starting with `:` are query text.
pub fn parse_line(line: &str) -> Result<ConsoleCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix(':') else {
        return Ok(ConsoleCommand::Type(line.to_string()));
    };

    let (name, arg) = match command.trim().split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    let cmd = match name {
        "go" | "search" => ConsoleCommand::Submit,
        "pick" => {
            let n: usize = arg
                .parse()
                .with_context(|| format!("':pick' expects a suggestion number, got '{arg}'"))?;
            if n == 0 {
                bail!("Suggestions are numbered from 1");
            }
            ConsoleCommand::Pick(n - 1)
        }
        "fix" => ConsoleCommand::AcceptCorrection,
        "hide" => ConsoleCommand::Hide,
        "retry" => ConsoleCommand::Retry,
        "next" => ConsoleCommand::Next,
        "prev" => ConsoleCommand::Prev,
        "page" => ConsoleCommand::Page(
            arg.parse()
                .with_context(|| format!("':page' expects a page number, got '{arg}'"))?,
        ),
        "platform" if !arg.is_empty() => ConsoleCommand::TogglePlatform(arg.to_string()),
        "category" => match arg {
            "" | "all" => ConsoleCommand::Category(None),
            other => ConsoleCommand::Category(Some(other.to_string())),
        },
        "price" => ConsoleCommand::Price(arg.parse()?),
        "rating" => match arg {
            "" | "any" => ConsoleCommand::MinRating(None),
            other => ConsoleCommand::MinRating(Some(
                other
                    .parse()
                    .with_context(|| format!("':rating' expects a number, got '{other}'"))?,
            )),
        },
        "nofilter" => ConsoleCommand::ClearFilters,
        "fav" if !arg.is_empty() => ConsoleCommand::ToggleFavorite(arg.to_string()),
        "favs" => ConsoleCommand::ListFavorites,
        "trending" => ConsoleCommand::Trending,
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        other => bail!("Unknown command ':{}' (try :help)", other),
    };
    Ok(cmd)
}

/// Apply a filter command to `filters`; returns `false` for non-filter commands
pub fn apply_filter_command(filters: &mut ResultFilters, command: &ConsoleCommand) -> bool {
    match command {
        ConsoleCommand::TogglePlatform(platform) => filters.toggle_platform(platform),
        ConsoleCommand::Category(category) => filters.category = category.clone(),
        ConsoleCommand::Price(price) => filters.price = *price,
        ConsoleCommand::MinRating(min) => filters.min_rating = *min,
        ConsoleCommand::ClearFilters => *filters = ResultFilters::default(),
        _ => return false,
    }
    true
}

fn render_course(out: &mut String, course: &Course, favorites: Option<&FavoritesStore>) {
    let star = match favorites {
        Some(store) if store.contains(&course.id) => "♥ ",
        _ => "  ",
    };
    let _ = write!(
        out,
        "{star}[{}] {} ({})",
        course.platform,
        truncate_chars(&course.title, TITLE_WIDTH),
        course.id
    );
    let mut facts = vec![course.instructor.clone()];
    if let Some(rating) = course.rating {
        facts.push(format!("{rating:.1}★"));
    }
    if let Some(price) = &course.price {
        facts.push(price.to_string());
    }
    facts.push(course.category.clone());
    facts.retain(|f| !f.is_empty());
    if !facts.is_empty() {
        let _ = write!(out, " - {}", facts.join(" · "));
    }
    out.push('\n');
}

/// Ranked keyword table, at most `limit` rows
pub fn render_trending(searches: &[TrendingSearch], limit: usize) -> String {
    if searches.is_empty() {
        return "No searches recorded yet.\n".to_string();
    }
    let shown = &searches[..searches.len().min(limit)];
    let width = shown
        .iter()
        .map(|s| s.keyword.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, search) in shown.iter().enumerate() {
        let _ = write!(
            out,
            "{:>2}. {:<width$}  {} searches",
            i + 1,
            search.keyword,
            search.search_count
        );
        if let Some(last) = &search.last_searched {
            let _ = write!(out, " (last: {last})");
        }
        out.push('\n');
    }
    out
}

/// Human-readable rendering of a view
pub fn render(view: &ViewState, favorites: Option<&FavoritesStore>) -> String {
    let mut out = String::new();
    match view {
        ViewState::Idle => {
            out.push_str("Type at least 2 characters for suggestions, :go to search.\n");
        }
        ViewState::AutocompleteVisible { suggestions } => {
            for (i, suggestion) in suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
            }
        }
        ViewState::Loading { query } => {
            let _ = writeln!(out, "Searching courses for \"{query}\"...");
        }
        ViewState::CorrectionNeeded { suggestion, .. } => {
            let _ = writeln!(out, "Did you mean: {suggestion}?  (:fix to search for it)");
        }
        ViewState::Blocked { query, reason } => {
            let _ = writeln!(out, "{reason}; \"{query}\" was not searched.  (:retry)");
        }
        ViewState::ResultsReady {
            query,
            courses,
            total,
            retryable,
        } => {
            if courses.is_empty() {
                let _ = writeln!(out, "No courses found for \"{query}\".");
                if *retryable {
                    out.push_str("The search could not be completed.  (:retry)\n");
                } else {
                    out.push_str("Try checking your spelling or using different keywords.\n");
                }
            } else {
                let _ = write!(out, "{} results found for \"{query}\"", courses.len());
                if courses.len() != *total {
                    let _ = write!(out, " (filtered from {total})");
                }
                out.push('\n');
                for course in courses {
                    render_course(&mut out, course, favorites);
                }
            }
        }
        ViewState::DefaultListing { page, items } => {
            let _ = writeln!(out, "Catalog page {page}");
            if items.is_empty() {
                out.push_str("No courses on this page.\n");
            }
            for course in items {
                render_course(&mut out, course, favorites);
            }
        }
    }
    out
}
