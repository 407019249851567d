use chrono::{Local, NaiveDateTime};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, Paragraph, Row, Table,
        Widget, Wrap,
    },
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, MenuField};
use qwiz::celebration::Celebration;
use qwiz::players;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Menu => render_menu(self, area, buf),
            AppState::Question | AppState::Reveal => render_question(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            AppState::Scores => render_scores(self, area, buf),
            AppState::Players => render_players(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        "Q W I Z",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center);
    title.render(chunks[0], buf);

    let field_line = |field: MenuField, label: &str, value: String| -> Line {
        let marker = if app.menu.field == field { "▸ " } else { "  " };
        let style = if app.menu.field == field {
            bold().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{marker}{label:<12}"), style),
            Span::styled(format!("◂ {value} ▸"), style),
        ])
    };

    let timer_value = match app.menu.timer_secs() {
        Some(secs) => format!("{secs}s per question"),
        None => "off".to_string(),
    };

    let fields = Paragraph::new(vec![
        field_line(
            MenuField::Difficulty,
            "difficulty",
            app.menu.difficulties[app.menu.difficulty_idx].clone(),
        ),
        field_line(
            MenuField::Category,
            "category",
            app.menu.categories[app.menu.category_idx].clone(),
        ),
        field_line(MenuField::Count, "questions", app.menu.count.to_string()),
        field_line(MenuField::Timer, "timer", timer_value),
    ])
    .alignment(Alignment::Center);
    fields.render(chunks[1], buf);

    if let Some(error) = &app.menu.error {
        let error_widget = Paragraph::new(Span::styled(
            error.clone(),
            bold().fg(Color::Red),
        ))
        .alignment(Alignment::Center);
        error_widget.render(chunks[2], buf);
    }

    let help = Paragraph::new(Span::styled(
        "↑/↓ field   ◂/▸ change   enter start   (v)iew high scores   esc quit",
        dim(),
    ))
    .alignment(Alignment::Center);
    help.render(chunks[3], buf);
}

fn render_question(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(question) = app.quiz.peek_current() else {
        return;
    };

    let timer_lines = if app.countdown.seconds_left().is_some() {
        2
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(timer_lines),
            Constraint::Length(4),
            Constraint::Length(app.options.len() as u16 + 1),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let (current, total) = app.quiz.progress();
    let header = Paragraph::new(Span::styled(
        format!(
            "question {current}/{total}   score {}   streak {}",
            app.quiz.score, app.quiz.streak
        ),
        bold(),
    ))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    if let (Some(left), Some(total_secs)) = (
        app.countdown.seconds_left(),
        app.quiz.session_config.seconds_per_question,
    ) {
        let ratio = (left / total_secs).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .ratio(ratio)
            .label(format!("{left:.0}s"))
            .gauge_style(if ratio < 0.25 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Cyan)
            });
        gauge.render(chunks[1], buf);
    }

    let inner_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2) as usize;
    let question_widget = Paragraph::new(Span::styled(question.text.clone(), bold()))
        .alignment(if question.text.width() <= inner_width {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    question_widget.render(chunks[2], buf);

    let reveal = if app.state == AppState::Reveal {
        app.reveal.as_ref()
    } else {
        None
    };

    let option_lines: Vec<Line> = app
        .options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let marker = if idx == app.selected && reveal.is_none() {
                "▸ "
            } else {
                "  "
            };
            let style = match reveal {
                Some(r) if *option == r.correct_answer => bold().fg(Color::Green),
                Some(r) if Some(option) == r.selected.as_ref() && !r.was_correct => {
                    bold().fg(Color::Red)
                }
                Some(_) => dim(),
                None if idx == app.selected => bold().fg(Color::Yellow),
                None => Style::default(),
            };
            Line::from(Span::styled(
                format!("{marker}{}. {option}", idx + 1),
                style,
            ))
        })
        .collect();
    Paragraph::new(option_lines).render(chunks[3], buf);

    let status: Line = match reveal {
        Some(r) if r.was_correct => Line::from(Span::styled(
            format!("correct! +{} pts", r.points),
            bold().fg(Color::Green),
        )),
        Some(r) if r.timed_out => Line::from(Span::styled(
            format!("time's up! the answer was {}", r.correct_answer),
            bold().fg(Color::Yellow),
        )),
        Some(r) if r.selected.is_none() => Line::from(Span::styled(
            format!("skipped. the answer was {}", r.correct_answer),
            bold().fg(Color::Yellow),
        )),
        Some(r) => Line::from(Span::styled(
            format!("wrong. the answer was {}", r.correct_answer),
            bold().fg(Color::Red),
        )),
        None => match &app.hint {
            Some(hint) => Line::from(Span::styled(
                format!("hint: {hint}"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::ITALIC),
            )),
            None => Line::default(),
        },
    };
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let help = if reveal.is_some() {
        "enter next question   esc menu"
    } else {
        "↑/↓ or 1-9 select   enter answer   (h)int   (s)kip   esc menu"
    };
    Paragraph::new(Span::styled(help, dim()))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(stats) = &app.final_stats else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // time-per-question chart
            Constraint::Length(1), // headline stats
            Constraint::Length(1), // counters
            Constraint::Length(1), // high-score banner
            Constraint::Length(1), // padding
            Constraint::Length(1), // name input / shortcuts
        ])
        .split(area);

    let tuples: Vec<(f64, f64)> = app
        .quiz
        .times()
        .iter()
        .map(|p| (p.question, p.secs))
        .collect();
    if !tuples.is_empty() {
        let max_q = tuples.last().map(|t| t.0).unwrap_or(1.0).max(1.0);
        let max_secs = tuples
            .iter()
            .map(|t| t.1)
            .fold(1.0_f64, f64::max)
            .ceil();
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&tuples)];
        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("question")
                    .bounds([1.0, max_q])
                    .labels(vec![
                        Span::styled("1", bold()),
                        Span::styled(format!("{max_q:.0}"), bold()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, max_secs])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(format!("{max_secs:.0}"), bold()),
                    ]),
            );
        chart.render(chunks[0], buf);
    }

    let headline = Paragraph::new(Span::styled(
        format!(
            "{} pts   {:.0}% acc   {:.1}s avg   best streak {}",
            stats.score, stats.accuracy, stats.avg_time_secs, stats.best_streak
        ),
        bold(),
    ))
    .alignment(Alignment::Center);
    headline.render(chunks[1], buf);

    let counters = Paragraph::new(Span::styled(
        format!(
            "{} correct   {} wrong   {} skipped   {} hints",
            stats.correct, stats.incorrect, stats.skipped, stats.hints_used
        ),
        Style::default().fg(Color::Cyan),
    ))
    .alignment(Alignment::Center);
    counters.render(chunks[2], buf);

    if app.got_high_score {
        let banner = Paragraph::new(Span::styled(
            "★ new high score ★",
            bold().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center);
        banner.render(chunks[3], buf);
    }

    let footer: Line = if !app.score_saved {
        Line::from(vec![
            Span::styled("name: ", dim()),
            Span::styled(format!("{}▏", app.name_input), bold()),
            Span::styled("  (enter saves your score)", dim()),
        ])
    } else {
        Line::from(Span::styled(
            "(r)eplay   (n)ew game   (h)igh scores   (p)layer stats   (t)weet   esc quit",
            dim(),
        ))
    };
    Paragraph::new(footer)
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    if app.celebration.is_active {
        render_celebration_particles(&app.celebration, area, buf);
    }
}

fn render_scores(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(area);

    let rows: Vec<Row> = app
        .high_scores
        .top_scores(10, None, None)
        .into_iter()
        .enumerate()
        .map(|(rank, entry)| {
            Row::new(vec![
                Cell::from(format!("{}", rank + 1)),
                Cell::from(entry.name),
                Cell::from(entry.score.to_string()),
                Cell::from(entry.date),
                Cell::from(entry.category),
                Cell::from(entry.difficulty),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["#", "name", "score", "date", "category", "difficulty"]).style(bold()))
    .column_spacing(2)
    .block(Block::default().borders(Borders::ALL).title("high scores"));
    ratatui::widgets::Widget::render(table, chunks[0], buf);

    Paragraph::new(Span::styled("(b)ack", dim()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn render_players(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(area);

    let name = if app.name_input.is_empty() {
        "Anonymous"
    } else {
        app.name_input.as_str()
    };
    let lines: Vec<Line> = match app.high_scores.players().get_player_stats(name) {
        Some(stats) => vec![
            Line::from(Span::styled(name.to_string(), bold().fg(Color::Magenta))),
            Line::from(format!(
                "games {}   total {}   best {}   average {:.1}",
                stats.games_played, stats.total_score, stats.highest_score, stats.average_score
            )),
            Line::from(format!(
                "answered {}   correct {}",
                stats.questions_answered, stats.correct_answers
            )),
            Line::from(format!("categories: {}", stats.categories_played.join(", "))),
            Line::from(format!("achievements: {}", stats.achievements.join(", "))),
            Line::from(Span::styled(
                format!("last played {}", humanize_date(&stats.last_played)),
                dim(),
            )),
        ],
        None => vec![Line::from(Span::styled(
            format!("no games recorded for {name}"),
            dim(),
        ))],
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let rows: Vec<Row> = app
        .high_scores
        .players()
        .leaderboard("total_score", 5)
        .into_iter()
        .enumerate()
        .map(|(rank, (player, total))| {
            Row::new(vec![
                Cell::from(format!("{}", rank + 1)),
                Cell::from(player),
                Cell::from(format!("{total:.0}")),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(20),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["#", "player", "total"]).style(bold()))
    .column_spacing(2)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("leaderboard (total score)"),
    );
    ratatui::widgets::Widget::render(table, chunks[1], buf);

    Paragraph::new(Span::styled("(b)ack", dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
}

/// "2 hours ago" when the stored stamp parses, the raw stamp otherwise.
fn humanize_date(stamp: &str) -> String {
    match NaiveDateTime::parse_from_str(stamp, players::DATE_FORMAT) {
        Ok(then) => {
            let secs = (Local::now().naive_local() - then).num_seconds();
            HumanTime::from(-secs).to_string()
        }
        Err(_) => stamp.to_string(),
    }
}

/// Render celebration particles on top of the results screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
    ];

    for particle in &celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let fade = particle.fade();
            let style = if particle.is_banner() {
                if fade > 0.4 {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                }
            } else if fade > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if fade > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}
