use chrono::{Datelike, Days, NaiveDate, Weekday};
use log::{info, warn};
use crate::errors::ParseFailure;
use crate::models::forecast::Forecast;

const ISSUE_ANCHOR: &str = "Issued at ";
const SECTION_HEADER: &str = "Forecast for";
const REST_OF: &str = "the rest of";
const MAX_KEYWORD: &str = "Maximum";

/// States of the line scanner
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ScanState {
    SeekingAnchor,
    SeekingSection,
    ScanningSection,
}

/// One day worth of forecasts from a bulletin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySection {
    pub ordinal: usize,
    pub date: NaiveDate,
    pub named_weekday: Option<Weekday>,
    pub forecasts: Vec<Forecast>,
}

/// A bulletin broken down into its issue date and consecutive day sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBulletin {
    pub issue_date: NaiveDate,
    pub sections: Vec<DaySection>,
}

impl ParsedBulletin {
    /// Returns true if section i is dated issue date + i days for every section
    ///
    pub fn is_contiguous(&self) -> bool {
        self.sections.iter().enumerate().all(|(i, s)| {
            s.ordinal == i && self.issue_date.checked_add_days(Days::new(i as u64)) == Some(s.date)
        })
    }

    /// Sections where the weekday named in the header disagrees with the ordinal date
    ///
    pub fn weekday_mismatches(&self) -> Vec<&DaySection> {
        self.sections
            .iter()
            .filter(|s| s.named_weekday.is_some_and(|w| w != s.date.weekday()))
            .collect()
    }

    /// Flattens all sections into a single list of forecasts in bulletin order
    ///
    pub fn into_forecasts(self) -> Vec<Forecast> {
        self.sections.into_iter().flat_map(|s| s.forecasts).collect()
    }
}

/// Extracts (location, date, max temperature) forecasts from bulletin text and logs the outcome.
///
/// A bulletin without day sections gives an empty list, which is treated as no data for today.
///
/// # Arguments
///
/// * 'text' - the full bulletin text
pub fn parse_forecasts(text: &str) -> Result<Vec<Forecast>, ParseFailure> {
    let bulletin = parse_bulletin(text)?;

    if !bulletin.is_contiguous() {
        warn!("Day sections of bulletin issued {} are not consecutive", bulletin.issue_date);
    }
    for s in bulletin.weekday_mismatches() {
        warn!("Section {} is headed {:?} but maps to {} ({})",
            s.ordinal, s.named_weekday, s.date, s.date.weekday());
    }

    let forecasts = bulletin.into_forecasts();
    info!("Parsed {} forecasts.", forecasts.len());

    Ok(forecasts)
}

/// Scans a bulletin line by line.
///
/// The scan first seeks the issue date anchor, then the first section header. Every header
/// thereafter opens the next day section, and section i is dated issue date + i days. Within a
/// section each line holding a location followed by "Maximum <n>." gives one forecast. A line
/// holding only a location carries over to the indented line(s) that follow it.
///
/// # Arguments
///
/// * 'text' - the full bulletin text
pub fn parse_bulletin(text: &str) -> Result<ParsedBulletin, ParseFailure> {
    let mut state = ScanState::SeekingAnchor;
    let mut issue_date: Option<NaiveDate> = None;
    let mut sections: Vec<DaySection> = Vec::new();
    let mut pending: Option<String> = None;

    for line in text.lines() {
        match state {
            ScanState::SeekingAnchor => {
                if let Some(date) = find_issue_date(line) {
                    issue_date = Some(date?);
                    state = ScanState::SeekingSection;
                }
            },

            ScanState::SeekingSection | ScanState::ScanningSection => {
                let Some(base) = issue_date else { break };
                let (leading, headers) = split_headers(line);

                if state == ScanState::ScanningSection {
                    if let Some(section) = sections.last_mut() {
                        if headers.is_empty() {
                            scan_section_line(section, line, &mut pending);
                        } else {
                            scan_into(section, leading);
                        }
                    }
                }
                if !headers.is_empty() {
                    pending = None;
                }

                for remainder in headers {
                    let ordinal = sections.len();
                    let Some(date) = base.checked_add_days(Days::new(ordinal as u64)) else {
                        warn!("Section {} is out of calendar range, ignoring rest of bulletin", ordinal);
                        return Ok(ParsedBulletin { issue_date: base, sections });
                    };

                    let mut section = DaySection {
                        ordinal,
                        date,
                        named_weekday: header_weekday(remainder),
                        forecasts: Vec::new(),
                    };
                    scan_into(&mut section, remainder);
                    sections.push(section);
                    state = ScanState::ScanningSection;
                }
            },
        }
    }

    match issue_date {
        Some(issue_date) => Ok(ParsedBulletin { issue_date, sections }),
        None => Err(ParseFailure::MissingIssueDate),
    }
}

/// Looks for the "Issued at ... on <Weekday> <Day> <Month> <Year>" anchor in a line.
///
/// Returns None if the line doesn't hold the anchor, and Some(Err) if it holds the anchor
/// but the date can't be made into a calendar date.
///
/// # Arguments
///
/// * 'line' - the line to search
fn find_issue_date(line: &str) -> Option<Result<NaiveDate, ParseFailure>> {
    let start = line.find(ISSUE_ANCHOR)? + ISSUE_ANCHOR.len();
    let rest = &line[start..];

    for (idx, _) in rest.match_indices(" on ") {
        let tokens = rest[idx + 4..].split_whitespace().take(4).collect::<Vec<&str>>();
        if let &[weekday, day, month, year] = tokens.as_slice() {
            if let Some(date) = issue_date_from_tokens(weekday, day, month, year) {
                return Some(date);
            }
        }
    }

    None
}

/// Builds the issue date from its four tokens, or None if the tokens don't have the shape
/// of a date (word, 1-2 digits, word, 4 digits)
///
/// # Arguments
///
/// * 'weekday' - name of the weekday, only checked against the resulting date
/// * 'day' - day of month
/// * 'month' - month name, full or abbreviated
/// * 'year' - token starting with a four-digit year
fn issue_date_from_tokens(weekday: &str, day: &str, month: &str, year: &str) -> Option<Result<NaiveDate, ParseFailure>> {
    let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphabetic());
    let month = month.trim_end_matches('.');
    let year = year.get(0..4)?;

    if !is_word(weekday) || !is_word(month)
        || day.is_empty() || day.len() > 2 || !day.bytes().all(|b| b.is_ascii_digit())
        || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let date_str = format!("{} {} {}", day, normalize_month(month), year);
    let date = match NaiveDate::parse_from_str(&date_str, "%d %B %Y") {
        Ok(d) => d,
        Err(e) => return Some(Err(ParseFailure::InvalidIssueDate(format!("'{}': {}", date_str, e)))),
    };

    if let Ok(named) = weekday.parse::<Weekday>() {
        if named != date.weekday() {
            warn!("Issue date {} is a {}, bulletin says {}", date, date.weekday(), weekday);
        }
    }

    Some(Ok(date))
}

/// Maps month abbreviations that the bulletin uses but which are not standard
///
/// # Arguments
///
/// * 'month' - month as written in the bulletin
fn normalize_month(month: &str) -> &str {
    match month {
        "Sept" => "September",
        m => m,
    }
}

/// Splits a line at every section header.
///
/// Returns the text ahead of the first header together with the text following each header,
/// where a leading "the rest of" is removed.
///
/// # Arguments
///
/// * 'line' - the line to split
fn split_headers(line: &str) -> (&str, Vec<&str>) {
    let positions = line.match_indices(SECTION_HEADER).map(|(i, _)| i).collect::<Vec<usize>>();
    let Some(&first) = positions.first() else {
        return (line, Vec::new());
    };

    let headers = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let end = positions.get(i + 1).copied().unwrap_or(line.len());
            let remainder = line[p + SECTION_HEADER.len()..end].trim_start();
            remainder.strip_prefix(REST_OF).unwrap_or(remainder)
        })
        .collect();

    (&line[..first], headers)
}

/// Weekday named first in a header remainder, e.g. "Saturday" in "Forecast for Saturday"
///
/// # Arguments
///
/// * 'remainder' - header text following "Forecast for"
fn header_weekday(remainder: &str) -> Option<Weekday> {
    let word = remainder.split_whitespace().next()?;
    let word = word.trim_end_matches(|c: char| !c.is_alphabetic());
    word.parse::<Weekday>().ok()
}

/// Scans one line and adds any forecast found to the section
///
/// # Arguments
///
/// * 'section' - the section the line belongs to
/// * 'line' - the line to scan
fn scan_into(section: &mut DaySection, line: &str) {
    if let Some((location, max_temp)) = scan_location_line(line) {
        section.forecasts.push(Forecast {
            location,
            forecast_date: section.date,
            max_temp: Some(max_temp),
        });
    }
}

/// Scans one ordinary section line.
///
/// A non-indented line with just a location is kept as pending. An indented line following it
/// is a continuation, and its "Maximum <n>." belongs to the pending location.
///
/// # Arguments
///
/// * 'section' - the section the line belongs to
/// * 'line' - the line to scan
/// * 'pending' - location waiting for its continuation line
fn scan_section_line(section: &mut DaySection, line: &str, pending: &mut Option<String>) {
    if line.trim().is_empty() {
        return;
    }

    let indented = line.starts_with(char::is_whitespace);
    if indented {
        if let Some(location) = pending.as_ref() {
            if let Some((_, max_temp)) = find_maximum(line) {
                section.forecasts.push(Forecast {
                    location: location.to_string(),
                    forecast_date: section.date,
                    max_temp: Some(max_temp),
                });
                *pending = None;
            }
            return;
        }
    } else {
        *pending = None;
    }

    if find_maximum(line).is_some() {
        scan_into(section, line);
    } else if !indented {
        *pending = location_only(line);
    }
}

/// Returns the line as a location if it holds nothing but a location
///
/// # Arguments
///
/// * 'line' - the line to check
fn location_only(line: &str) -> Option<String> {
    let line = line.trim();
    if !line.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }

    let (run, terminator) = location_run(line);
    if terminator.is_some() || run.len() != line.len() {
        return None;
    }
    Some(run.trim().to_string())
}

/// Finds a location followed later on the same line by "Maximum <n>.".
///
/// The location is the run of letters, spaces, parentheses and hyphens that starts the line
/// with an uppercase letter. The run ends at any other character, at two consecutive blanks
/// (the bulletin's column gap) or at the "Maximum" keyword. A description sentence glued to
/// the location by a single blank ("Hobart Partly cloudy.") is cut off.
///
/// # Arguments
///
/// * 'line' - the line to scan
fn scan_location_line(line: &str) -> Option<(String, i32)> {
    let (keyword_at, max_temp) = find_maximum(line)?;

    let prefix = line[..keyword_at].trim_start();
    if !prefix.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }

    let (run, terminator) = location_run(prefix);
    let location = match terminator {
        Some('.') | Some(',') | Some(':') => strip_description(run),
        _ => run.trim().to_string(),
    };

    if location.is_empty() {
        None
    } else {
        Some((location, max_temp))
    }
}

/// Leading run of location characters and the character that ended it, if any. Blanks
/// ending the run are not reported as terminator.
///
/// # Arguments
///
/// * 'text' - text starting with the location
fn location_run(text: &str) -> (&str, Option<char>) {
    let mut prev_blank = false;
    for (i, c) in text.char_indices() {
        let blank = c == ' ';
        if c == '\t' || (blank && prev_blank) {
            return (&text[..i], None);
        }
        if !(c.is_alphabetic() || blank || matches!(c, '(' | ')' | '-')) {
            return (&text[..i], Some(c));
        }
        prev_blank = blank;
    }
    (text, None)
}

/// Cuts a trailing sentence such as "Partly cloudy" from a location run. The sentence starts
/// with a capitalised word that is followed only by lowercase words.
///
/// # Arguments
///
/// * 'run' - location run ended by punctuation
fn strip_description(run: &str) -> String {
    let words = run.split_whitespace().collect::<Vec<&str>>();
    let is_lower = |w: &str| w.chars().all(|c| c.is_lowercase() || c == '-');
    let is_capitalised = |w: &str| {
        w.starts_with(|c: char| c.is_uppercase()) && w.chars().all(|c| c.is_alphabetic() || c == '-')
    };

    let split = (1..words.len().saturating_sub(1))
        .find(|&k| is_capitalised(words[k]) && words[k + 1..].iter().all(|&w| is_lower(w)));

    match split {
        Some(k) => words[..k].join(" "),
        None => words.join(" "),
    }
}

/// Finds the first "Maximum <n>." in a line and returns the keyword's byte offset and n
///
/// # Arguments
///
/// * 'line' - the line to search
fn find_maximum(line: &str) -> Option<(usize, i32)> {
    line.match_indices(MAX_KEYWORD).find_map(|(i, _)| {
        let after = &line[i + MAX_KEYWORD.len()..];
        let number = after.trim_start();
        if number.len() == after.len() {
            return None;
        }

        let digits_start = if number.starts_with('-') { 1 } else { 0 };
        let digits_end = number[digits_start..]
            .find(|c: char| !c.is_ascii_digit())
            .map(|e| e + digits_start)?;

        if digits_end == digits_start || !number[digits_end..].starts_with('.') {
            return None;
        }

        number[..digits_end].parse::<i32>().ok().map(|t| (i, t))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const BULLETIN: &str = "\
IDT16710
Australian Government Bureau of Meteorology
Tasmania

Issued at 4:30 pm EDT on Saturday 2 January 2021
for the period until midnight EDT Tuesday 5 January 2021.

Forecast for the rest of Saturday
Hobart          Partly cloudy. Maximum 24.
Launceston      Sunny. Maximum 27.

Forecast for Sunday
Hobart          Shower or two. Minimum 12. Maximum 19.
Dunalley (Henry anson)   Showers. Maximum 18.

Forecast for Monday
Mount Wellington  Snow showers. Minimum 2.
Low Head        Cloudy. Maximum 17.
";

    #[test]
    fn sections_map_to_consecutive_days() {
        let bulletin = parse_bulletin(BULLETIN).unwrap();

        assert_eq!(bulletin.issue_date, date(2021, 1, 2));
        assert_eq!(bulletin.sections.len(), 3);
        assert_eq!(bulletin.sections[0].date, date(2021, 1, 2));
        assert_eq!(bulletin.sections[1].date, date(2021, 1, 3));
        assert_eq!(bulletin.sections[2].date, date(2021, 1, 4));
        assert_eq!(bulletin.sections[0].named_weekday, Some(Weekday::Sat));
        assert_eq!(bulletin.sections[2].named_weekday, Some(Weekday::Mon));
        assert!(bulletin.is_contiguous());
        assert!(bulletin.weekday_mismatches().is_empty());
    }

    #[test]
    fn extracts_locations_and_maximums() {
        let forecasts = parse_forecasts(BULLETIN).unwrap();

        let got = forecasts
            .iter()
            .map(|f| (f.location.as_str(), f.forecast_date, f.max_temp))
            .collect::<Vec<_>>();

        assert_eq!(got, vec![
            ("Hobart", date(2021, 1, 2), Some(24)),
            ("Launceston", date(2021, 1, 2), Some(27)),
            ("Hobart", date(2021, 1, 3), Some(19)),
            ("Dunalley (Henry anson)", date(2021, 1, 3), Some(18)),
            ("Low Head", date(2021, 1, 4), Some(17)),
        ]);
    }

    #[test]
    fn minimum_alone_does_not_match() {
        assert_eq!(scan_location_line("Hobart          Cold. Minimum 5."), None);
        assert_eq!(scan_location_line("Hobart          Mild. Maximum 23."), Some(("Hobart".to_string(), 23)));
        assert_eq!(scan_location_line("Hobart  Minimum 5. Maximum 23."), Some(("Hobart".to_string(), 23)));
    }

    #[test]
    fn maximum_needs_number_and_period() {
        assert_eq!(scan_location_line("Hobart  Maximum twenty."), None);
        assert_eq!(scan_location_line("Hobart  Maximum 23"), None);
        assert_eq!(scan_location_line("Hobart  Maximum23."), None);
        assert_eq!(scan_location_line("hobart  Maximum 23."), None);
        assert_eq!(scan_location_line("Liawenee  Snow. Maximum -1."), Some(("Liawenee".to_string(), -1)));
    }

    #[test]
    fn end_to_end_single_location() {
        let text = "Issued at 5:00 pm on Friday 1 January 2021\nForecast for Hobart. Sunny. Maximum 28.\n";
        let forecasts = parse_forecasts(text).unwrap();

        assert_eq!(forecasts, vec![Forecast {
            location: "Hobart".to_string(),
            forecast_date: date(2021, 1, 1),
            max_temp: Some(28),
        }]);
    }

    #[test]
    fn missing_anchor_is_a_parse_failure() {
        let text = "Forecast for Saturday\nHobart  Sunny. Maximum 28.\n";
        assert_eq!(parse_forecasts(text), Err(ParseFailure::MissingIssueDate));
        assert_eq!(parse_forecasts(""), Err(ParseFailure::MissingIssueDate));
    }

    #[test]
    fn impossible_date_is_a_parse_failure() {
        let text = "Issued at 5:00 pm on Friday 31 February 2021\nForecast for Friday\n";
        assert!(matches!(parse_forecasts(text), Err(ParseFailure::InvalidIssueDate(_))));
    }

    #[test]
    fn sept_abbreviation_is_normalized() {
        let text = "Issued at 4:30 pm EST on Friday 6 Sept 2024\nForecast for the rest of Friday\nHobart  Fine. Maximum 15.\n";
        let forecasts = parse_forecasts(text).unwrap();
        assert_eq!(forecasts[0].forecast_date, date(2024, 9, 6));

        let text = "Issued at 4:30 pm EST on Saturday 7 September 2024\n";
        assert_eq!(parse_bulletin(text).unwrap().issue_date, date(2024, 9, 7));
    }

    #[test]
    fn no_sections_means_no_data() {
        let text = "Issued at 5:00 pm on Friday 1 January 2021\nNo forecasts today.\n";
        assert_eq!(parse_forecasts(text), Ok(Vec::new()));
    }

    #[test]
    fn preamble_and_empty_sections_contribute_nothing() {
        let text = "\
Issued at 5:00 pm on Friday 1 January 2021
Hobart  Preamble line. Maximum 99.
Forecast for the rest of Friday
Nothing but words here.
Forecast for Saturday
Hobart  Sunny. Maximum 30.
";
        let bulletin = parse_bulletin(text).unwrap();
        assert_eq!(bulletin.sections.len(), 2);
        assert!(bulletin.sections[0].forecasts.is_empty());

        let forecasts = bulletin.into_forecasts();
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].forecast_date, date(2021, 1, 2));
        assert_eq!(forecasts[0].max_temp, Some(30));
    }

    #[test]
    fn headers_before_anchor_are_ignored() {
        let text = "\
Forecast for Tasmania
Issued at 5:00 pm on Friday 1 January 2021
Forecast for the rest of Friday
Hobart  Sunny. Maximum 28.
";
        let bulletin = parse_bulletin(text).unwrap();
        assert_eq!(bulletin.sections.len(), 1);
        assert_eq!(bulletin.sections[0].date, date(2021, 1, 1));
    }

    #[test]
    fn mismatching_header_weekday_is_reported() {
        let text = "\
Issued at 5:00 pm on Friday 1 January 2021
Forecast for the rest of Friday
Forecast for Sunday
";
        let bulletin = parse_bulletin(text).unwrap();
        assert!(bulletin.is_contiguous());
        assert_eq!(bulletin.weekday_mismatches().len(), 1);
        assert_eq!(bulletin.weekday_mismatches()[0].ordinal, 1);
    }

    #[test]
    fn unknown_locations_still_surface() {
        let text = "\
Issued at 5:00 pm on Friday 1 January 2021
Forecast for Friday
Some-New Place (East)   Windy. Maximum 21.
";
        let forecasts = parse_forecasts(text).unwrap();
        assert_eq!(forecasts[0].location, "Some-New Place (East)");
    }

    #[test]
    fn location_on_its_own_line_carries_over() {
        let text = "\
Issued at 5:00 pm on Friday 1 January 2021
Forecast for Friday
Hobart
    Partly cloudy. Maximum 24.
Dunalley (Henry anson)
    Showers developing
    later. Maximum 19.

Launceston      Sunny. Maximum 27.
";
        let got = parse_forecasts(text)
            .unwrap()
            .into_iter()
            .map(|f| (f.location, f.max_temp))
            .collect::<Vec<_>>();

        assert_eq!(got, vec![
            ("Hobart".to_string(), Some(24)),
            ("Dunalley (Henry anson)".to_string(), Some(19)),
            ("Launceston".to_string(), Some(27)),
        ]);
    }

    #[test]
    fn pending_location_ends_at_next_unindented_line() {
        let text = "\
Issued at 5:00 pm on Friday 1 January 2021
Forecast for Friday
Hobart
Cloudy with rain.
    with gusts. Maximum 16.
";
        assert!(parse_forecasts(text).unwrap().is_empty());
    }

    #[test]
    fn description_after_single_blank_is_cut_off() {
        assert_eq!(scan_location_line("Hobart Partly cloudy. Maximum 24."), Some(("Hobart".to_string(), 24)));
        assert_eq!(scan_location_line("Hobart Airport Shower or two. Maximum 18."), Some(("Hobart Airport".to_string(), 18)));
        assert_eq!(
            scan_location_line("Dunalley (Henry anson) Showers easing. Maximum 19."),
            Some(("Dunalley (Henry anson)".to_string(), 19)),
        );
        assert_eq!(scan_location_line("Hobart: Sunny. Maximum 30."), Some(("Hobart".to_string(), 30)));
        assert_eq!(scan_location_line("Low Head Maximum 17."), Some(("Low Head".to_string(), 17)));
    }
}
