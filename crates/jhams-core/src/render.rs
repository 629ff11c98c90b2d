use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{DAYS_PER_WEEK, GridCell, Locale, MonthGrid, month_name, weekday_labels};
use crate::checklist::Checklist;
use crate::config::Config;
use crate::datetime::CalendarDate;
use crate::event::Event;
use crate::notification::{KIND_TABLE, NotificationFilter, NotificationSettings, Notifications};

const CELL_WIDTH: usize = 5;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            locale: cfg.locale()?,
        })
    }

    pub fn plain(locale: Locale) -> Self {
        Self {
            color: false,
            locale,
        }
    }

    #[tracing::instrument(skip(self, grid))]
    pub fn print_month(&self, grid: &MonthGrid, pad: bool) -> anyhow::Result<()> {
        self.write_month(io::stdout().lock(), grid, pad)
    }

    /// Selected day in brackets, `*` after days with events, today highlighted.
    pub fn write_month<W: Write>(&self, mut out: W, grid: &MonthGrid, pad: bool) -> anyhow::Result<()> {
        let title = format!("{} {}", month_name(grid.month0(), self.locale), grid.year());
        let total = CELL_WIDTH * DAYS_PER_WEEK;
        let title_width = UnicodeWidthStr::width(title.as_str());
        writeln!(out, "{}{}", " ".repeat(total.saturating_sub(title_width) / 2), title)?;

        for label in weekday_labels(self.locale) {
            write!(out, " {label:<3} ")?;
        }
        writeln!(out)?;

        if pad {
            for week in grid.padded().chunks(DAYS_PER_WEEK) {
                self.write_week(&mut out, week)?;
            }
        } else {
            for week in grid.weeks() {
                self.write_week(&mut out, week)?;
            }
        }

        Ok(())
    }

    fn write_week<W: Write>(&self, out: &mut W, week: &[GridCell]) -> anyhow::Result<()> {
        let line = week
            .iter()
            .map(|cell| self.format_cell(cell))
            .collect::<String>();
        writeln!(out, "{}", line.trim_end())?;
        Ok(())
    }

    /// Without color, today is wrapped in `<dd>` unless it is also selected.
    fn format_cell(&self, cell: &GridCell) -> String {
        let GridCell::Day(day) = cell else {
            return " ".repeat(CELL_WIDTH);
        };

        let number = format!("{:>2}", day.date.day());
        let number = if day.is_today {
            self.paint(&number, "7")
        } else {
            number
        };
        let (open, close) = if day.is_selected {
            ('[', ']')
        } else if day.is_today && !self.color {
            ('<', '>')
        } else {
            (' ', ' ')
        };
        let dot = if day.has_event { '*' } else { ' ' };
        format!("{open}{number}{close}{dot}")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_events(&self, date: &CalendarDate, events: &[Event]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.format_date(date))?;
        if events.is_empty() {
            writeln!(out, "no events")?;
            return Ok(());
        }
        self.write_events(&mut out, events)
    }

    pub fn write_events<W: Write>(&self, out: W, events: &[Event]) -> anyhow::Result<()> {
        let headers = ["Time", "Duration", "Kind", "Title", "Location", "Instructor"]
            .map(str::to_string)
            .to_vec();

        let rows = events
            .iter()
            .map(|event| {
                let style = event.kind.style();
                vec![
                    event.time.clone(),
                    event.duration_label.clone(),
                    self.paint(&format!("{} {}", style.glyph, style.label), style.ansi),
                    event.title.clone(),
                    event.location.clone(),
                    event.instructor_name.clone(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_upcoming(&self, events: &[Event]) -> anyhow::Result<()> {
        let headers = ["Date", "Time", "Title"].map(str::to_string).to_vec();
        let rows = events
            .iter()
            .map(|event| {
                vec![
                    self.paint(&self.format_date(&event.date), "33"),
                    event.time.clone(),
                    event.title.clone(),
                ]
            })
            .collect();
        write_table(io::stdout().lock(), headers, rows)
    }

    #[tracing::instrument(skip(self, checklist))]
    pub fn print_checklist(&self, checklist: &Checklist) -> anyhow::Result<()> {
        self.write_checklist(io::stdout().lock(), checklist)
    }

    pub fn write_checklist<W: Write>(&self, mut out: W, checklist: &Checklist) -> anyhow::Result<()> {
        let headers = ["ID", "Done", "Due", "Priority", "Description"]
            .map(str::to_string)
            .to_vec();

        let rows = checklist
            .items()
            .iter()
            .map(|item| {
                vec![
                    self.paint(&item.id.to_string(), "33"),
                    if item.completed { "[x]" } else { "[ ]" }.to_string(),
                    self.format_date(&item.due_date),
                    self.paint(item.priority.label(), item.priority.ansi()),
                    item.description.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        writeln!(
            out,
            "{}/{} done",
            checklist.completed_count(),
            checklist.items().len()
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, notifications))]
    pub fn print_notifications(
        &self,
        notifications: &Notifications,
        filter: NotificationFilter,
    ) -> anyhow::Result<()> {
        self.write_notifications(io::stdout().lock(), notifications, filter)
    }

    pub fn write_notifications<W: Write>(
        &self,
        mut out: W,
        notifications: &Notifications,
        filter: NotificationFilter,
    ) -> anyhow::Result<()> {
        let mut summary = vec![
            format!("all {}", notifications.count_for(NotificationFilter::All)),
            format!("unread {}", notifications.unread_count()),
        ];
        for row in &KIND_TABLE {
            let count = notifications.count_for(NotificationFilter::Kind(row.kind));
            if count > 0 {
                summary.push(format!("{} {count}", row.key));
            }
        }
        writeln!(out, "{}", summary.join(" | "))?;

        let headers = ["ID", "", "Kind", "Priority", "Title", "When"]
            .map(str::to_string)
            .to_vec();

        let rows = notifications
            .filtered(filter)
            .into_iter()
            .map(|n| {
                let display = n.kind.display();
                let id = if n.read {
                    n.id.to_string()
                } else {
                    format!("{}•", n.id)
                };
                vec![
                    self.paint(&id, "33"),
                    self.paint(display.glyph, display.ansi),
                    display.label.to_string(),
                    self.paint(n.priority.label(), n.priority.ansi()),
                    n.title.clone(),
                    n.timestamp_label.clone(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_settings(&self, settings: &NotificationSettings) -> anyhow::Result<()> {
        self.write_settings(io::stdout().lock(), settings)
    }

    pub fn write_settings<W: Write>(&self, out: W, settings: &NotificationSettings) -> anyhow::Result<()> {
        let headers = ["Setting", "Enabled"].map(str::to_string).to_vec();
        let rows = settings
            .iter()
            .map(|(key, enabled)| {
                let state = if enabled {
                    self.paint("on", "32")
                } else {
                    self.paint("off", "90")
                };
                vec![key.to_string(), state]
            })
            .collect();
        write_table(out, headers, rows)
    }

    pub fn print_config(&self, cfg: &Config) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let mut entries = cfg.iter().collect::<Vec<_>>();
        entries.sort();
        for (key, value) in entries {
            writeln!(out, "{key}={value}")?;
        }
        for file in &cfg.loaded_files {
            writeln!(out, "# loaded {}", file.display())?;
        }
        Ok(())
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn format_date(&self, date: &CalendarDate) -> String {
        match self.locale {
            Locale::PtBr => format!("{:02}/{:02}/{:04}", date.day(), date.month0() + 1, date.year()),
            Locale::En => date.to_iso(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad_cell(header, *width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_cell(cell, *width))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn pad_cell(cell: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    format!("{cell}{}", " ".repeat(width.saturating_sub(visible_width)))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
