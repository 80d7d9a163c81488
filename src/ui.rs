use crate::models::{MonthSummary, Record};
use crate::stats::month_weeks;
use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn render_index(
    summary: &MonthSummary,
    selected: Option<NaiveDate>,
    day_records: &[Record],
    today: NaiveDate,
) -> String {
    let month_name = MONTH_NAMES
        .get(summary.month.saturating_sub(1) as usize)
        .unwrap_or(&"?");

    INDEX_HTML
        .replace("{{MONTH_TITLE}}", &format!("{} {}", month_name, summary.year))
        .replace("{{TOTAL}}", &format_amount(summary.total))
        .replace("{{YEAR_OPTIONS}}", &year_options(summary.year, today))
        .replace("{{MONTH_OPTIONS}}", &month_options(summary.month))
        .replace("{{CALENDAR_ROWS}}", &calendar_rows(summary, selected, today))
        .replace("{{EDITOR}}", &editor(summary, selected, day_records))
}

/// Whole amounts render without decimals, everything else with two.
pub fn format_amount(amount: f64) -> String {
    if (amount - amount.round()).abs() < 1e-9 {
        format!("{}", amount.round() as i64)
    } else {
        format!("{amount:.2}")
    }
}

fn year_options(year: i32, today: NaiveDate) -> String {
    let start = year.min(today.year() - 2);
    let end = year.max(today.year() + 2);
    (start..=end)
        .map(|candidate| {
            let selected = if candidate == year { " selected" } else { "" };
            format!("<option value=\"{candidate}\"{selected}>{candidate}</option>")
        })
        .collect()
}

fn month_options(month: u32) -> String {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let value = index as u32 + 1;
            let selected = if value == month { " selected" } else { "" };
            format!("<option value=\"{value}\"{selected}>{name}</option>")
        })
        .collect()
}

fn calendar_rows(summary: &MonthSummary, selected: Option<NaiveDate>, today: NaiveDate) -> String {
    let mut rows = String::new();
    for week in month_weeks(summary.year, summary.month) {
        rows.push_str("<tr>");
        for day in week {
            if day == 0 {
                rows.push_str("<td class=\"blank\"></td>");
                continue;
            }
            let Some(date) = NaiveDate::from_ymd_opt(summary.year, summary.month, day) else {
                rows.push_str("<td class=\"blank\"></td>");
                continue;
            };

            let mut class = String::from("day");
            if Some(date) == selected {
                class.push_str(" selected");
            }
            if date == today {
                class.push_str(" today");
            }

            let spent = summary.daily.get(&day).copied().unwrap_or(0.0);
            let spent_label = if spent > 0.0 {
                format!("<span class=\"spent\">${}</span>", format_amount(spent))
            } else {
                String::new()
            };

            rows.push_str(&format!(
                "<td><a class=\"{class}\" href=\"/?date={date}\"><span class=\"num\">{day}</span>{spent_label}</a></td>"
            ));
        }
        rows.push_str("</tr>");
    }
    rows
}

fn editor(summary: &MonthSummary, selected: Option<NaiveDate>, day_records: &[Record]) -> String {
    let Some(date) = selected else {
        return String::from("<p class=\"hint\">Click a day to add or remove entries.</p>");
    };

    let mut entries = String::new();
    if day_records.is_empty() {
        entries.push_str("<p class=\"hint\">Nothing recorded for this day yet.</p>");
    } else {
        entries.push_str("<ul class=\"entries\">");
        for record in day_records {
            let photo_link = match &record.photo {
                Some(name) => format!(
                    " <a class=\"photo\" href=\"/photos/{name}\">photo</a>",
                    name = escape_html(name)
                ),
                None => String::new(),
            };
            entries.push_str(&format!(
                "<li><span class=\"item\">{item}</span><span class=\"price\">${amount}</span>{photo_link}\
                 <form class=\"delete\" method=\"post\" action=\"/records/{id}/delete\">\
                 <input type=\"hidden\" name=\"date\" value=\"{date}\" />\
                 <button type=\"submit\">Delete</button></form></li>",
                item = escape_html(&record.item),
                amount = format_amount(record.amount),
                id = record.id,
            ));
        }
        entries.push_str("</ul>");
    }

    format!(
        "<section class=\"editor\">\
         <h2>Editing {date}</h2>\
         {entries}\
         <form class=\"add\" method=\"post\" action=\"/records\">\
         <input type=\"hidden\" name=\"date\" value=\"{date}\" />\
         <input name=\"item\" placeholder=\"Item\" required />\
         <input name=\"amount\" type=\"number\" min=\"0\" step=\"any\" placeholder=\"Price\" required />\
         <input name=\"photo\" placeholder=\"Photo file (optional)\" />\
         <button type=\"submit\">Save</button>\
         </form>\
         <a class=\"close\" href=\"/?year={year}&month={month}\">Close</a>\
         </section>",
        year = summary.year,
        month = summary.month,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Diet Diary</title>
  <style>
    :root {
      --bg: #fffdf5;
      --ink: #5d4037;
      --cell: #ffecb3;
      --cell-edge: #ffe082;
      --cell-hot: #ffd54f;
      --accent: #d84315;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif;
      display: grid;
      justify-items: center;
      padding: 28px 14px 48px;
    }

    .app {
      width: min(720px, 100%);
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.6rem, 4vw, 2.2rem);
    }

    .subtitle {
      margin: 0;
      color: #8d6e63;
    }

    .selector {
      display: flex;
      gap: 10px;
      align-items: center;
    }

    .selector select,
    .selector button,
    .editor input,
    .editor button {
      font-size: 1rem;
      padding: 6px 10px;
      border: 2px solid var(--cell-edge);
      border-radius: 10px;
      background: white;
      color: var(--ink);
    }

    .total {
      font-size: 1.1rem;
    }

    .total strong {
      color: var(--accent);
      font-size: 1.5rem;
    }

    table.calendar {
      width: 100%;
      border-collapse: separate;
      border-spacing: 4px;
      table-layout: fixed;
    }

    table.calendar th {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: #8d6e63;
      padding-bottom: 4px;
    }

    td.blank {
      background: transparent;
    }

    a.day {
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      gap: 2px;
      min-height: 56px;
      background: var(--cell);
      border: 2px solid var(--cell-edge);
      border-radius: 14px;
      text-decoration: none;
      color: var(--ink);
      font-weight: bold;
      box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
    }

    a.day:hover {
      background: var(--cell-hot);
    }

    a.day.selected {
      outline: 3px solid var(--accent);
    }

    a.day.today .num {
      text-decoration: underline;
    }

    a.day .spent {
      font-size: 0.75rem;
      font-weight: normal;
      color: var(--accent);
    }

    .editor {
      background: white;
      border: 2px solid var(--cell-edge);
      border-radius: 14px;
      padding: 16px;
      display: grid;
      gap: 12px;
    }

    .editor h2 {
      margin: 0;
      font-size: 1.2rem;
    }

    .entries {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .entries li {
      display: flex;
      align-items: center;
      gap: 10px;
    }

    .entries .item {
      flex: 1;
    }

    .entries .price {
      color: var(--accent);
      font-weight: bold;
    }

    .entries form.delete {
      margin: 0;
    }

    form.add {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    form.add input[name="item"] {
      flex: 2;
      min-width: 140px;
    }

    form.add input[name="amount"] {
      flex: 1;
      min-width: 90px;
    }

    form.add input[name="photo"] {
      flex: 2;
      min-width: 140px;
    }

    .hint {
      margin: 0;
      color: #8d6e63;
      font-size: 0.95rem;
    }

    a.close {
      color: #8d6e63;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Diet Diary</h1>
      <p class="subtitle">Click a day to record what you ate and what it cost.</p>
    </header>

    <form class="selector" method="get" action="/">
      <select name="year">{{YEAR_OPTIONS}}</select>
      <select name="month">{{MONTH_OPTIONS}}</select>
      <button type="submit">Show</button>
    </form>

    <p class="total">Spent in {{MONTH_TITLE}}: <strong>${{TOTAL}}</strong></p>

    <table class="calendar">
      <thead>
        <tr><th>Mon</th><th>Tue</th><th>Wed</th><th>Thu</th><th>Fri</th><th>Sat</th><th>Sun</th></tr>
      </thead>
      <tbody>
        {{CALENDAR_ROWS}}
      </tbody>
    </table>

    {{EDITOR}}
  </main>
</body>
</html>
"#;
