//! Interactive terminal session: pick a location, search, then browse details one business at a time.

use std::io::{BufRead, Write};

use anyhow::Result;
use log::{debug, error, info};

use crate::analysis::{analyze_reviews, CompletionProvider};
use crate::google_places::PlacesProvider;
use crate::models::{BusinessSummary, Coordinate, PlaceDetail};
use crate::search::{find_businesses, no_results_message, SearchSource};
use crate::utils::{normalize_keyword, rating_display};

/// Grand Rapids, MI.
pub const DEFAULT_LOCATION: Coordinate = Coordinate { lat: 42.9634, lng: -85.6681 };

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq)]
enum LocationChoice {
    Default,
    Address(String),
}

pub struct Shell<'a, R, W> {
    places: &'a dyn PlacesProvider,
    analyst: &'a dyn CompletionProvider,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(
        places: &'a dyn PlacesProvider,
        analyst: &'a dyn CompletionProvider,
        input: R,
        output: W,
    ) -> Self {
        Self {
            places,
            analyst,
            input,
            output,
        }
    }

    /// Run one session. Returns when the user exits, input ends, or nothing was found.
    pub async fn run(&mut self) -> Result<()> {
        let Some(choice) = self.collect_location()? else {
            return Ok(());
        };

        let location = match choice {
            LocationChoice::Default => DEFAULT_LOCATION,
            LocationChoice::Address(address) => {
                debug!("Converting address to coordinates...");
                match self.places.geocode(&address).await {
                    Ok(coordinate) => coordinate,
                    Err(e) => {
                        error!("Could not geocode '{}': {}", address, e);
                        writeln!(self.output, "Could not find coordinates for that address!")?;
                        return Ok(());
                    }
                }
            }
        };
        debug!("Location coordinates: ({}, {})", location.lat, location.lng);

        writeln!(
            self.output,
            "\nYou can search for specific types of businesses (e.g., 'pizza', 'coffee', 'bar')"
        )?;
        let Some(raw_keyword) = self.prompt("Enter a search term (or press Enter to skip): ")? else {
            return Ok(());
        };
        let keyword = normalize_keyword(Some(&raw_keyword));

        let search = find_businesses(self.places, location, keyword.as_deref()).await;
        if search.source == SearchSource::TextFallback {
            writeln!(self.output, "No nearby results found, trying text search...")?;
        }
        if search.is_empty() {
            self.report_no_results(keyword.as_deref())?;
            return Ok(());
        }

        self.browse(&search.results).await
    }

    async fn browse(&mut self, businesses: &[BusinessSummary]) -> Result<()> {
        loop {
            writeln!(self.output, "\nNearby Businesses:")?;
            self.display_businesses(businesses)?;

            let choice = match self.select(businesses.len())? {
                Some(0) | None => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                Some(choice) => choice,
            };

            let selected = &businesses[choice - 1];
            writeln!(self.output, "\nFetching details for {}...", selected.name)?;
            info!("User selected {} ({})", selected.name, selected.place_id);

            match self.places.place_details(&selected.place_id).await {
                Ok(detail) => {
                    if !self.display_place(&detail).await? {
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!("Could not fetch details for {}: {}", selected.place_id, e);
                    writeln!(self.output, "Sorry, couldn't fetch details for this place.")?;
                }
            }

            let again = self.prompt("\nWould you like to check another business? (y/n): ")?;
            if !is_yes(again.as_deref()) {
                writeln!(self.output, "Goodbye!")?;
                return Ok(());
            }
        }
    }

    fn collect_location(&mut self) -> Result<Option<LocationChoice>> {
        writeln!(self.output, "\nHow would you like to specify the location?")?;
        writeln!(self.output, "1. Use Grand Rapids, MI (default)")?;
        writeln!(self.output, "2. Enter a zip code")?;
        writeln!(self.output, "3. Enter an address")?;

        loop {
            let Some(choice) = self.prompt("Enter your choice (1-3): ")? else {
                return Ok(None);
            };
            match choice.trim() {
                "" | "1" => return Ok(Some(LocationChoice::Default)),
                "2" | "3" => {
                    let Some(address) = self.prompt("Enter your zip code or address: ")? else {
                        return Ok(None);
                    };
                    return Ok(Some(LocationChoice::Address(address.trim().to_string())));
                }
                _ => writeln!(self.output, "Please enter 1, 2, or 3")?,
            }
        }
    }

    fn select(&mut self, max_choice: usize) -> Result<Option<usize>> {
        loop {
            let message = format!("Enter a number (1-{max_choice}) to see details, or 0 to exit: ");
            let Some(line) = self.prompt(&message)? else {
                return Ok(None);
            };
            match line.trim().parse::<usize>() {
                Ok(choice) if choice <= max_choice => return Ok(Some(choice)),
                Ok(_) => writeln!(self.output, "Please enter a number between 0 and {max_choice}")?,
                Err(_) => writeln!(self.output, "Please enter a valid number")?,
            }
        }
    }

    fn display_businesses(&mut self, businesses: &[BusinessSummary]) -> Result<()> {
        for (idx, business) in businesses.iter().enumerate() {
            writeln!(
                self.output,
                "{}. {} - {}",
                idx + 1,
                business.name,
                business.address().unwrap_or("")
            )?;
            writeln!(self.output, "   Rating: {}", rating_display(business.rating))?;
            writeln!(self.output)?;
        }
        Ok(())
    }

    /// Returns `false` when input ended mid-display.
    async fn display_place(&mut self, detail: &PlaceDetail) -> Result<bool> {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(self.output, "\n{rule}")?;
        writeln!(self.output, "Name: {}", detail.name)?;
        writeln!(self.output, "Address: {}", detail.formatted_address.as_deref().unwrap_or("N/A"))?;
        writeln!(self.output, "Phone: {}", detail.formatted_phone_number.as_deref().unwrap_or("N/A"))?;
        writeln!(self.output, "Rating: {}", rating_display(detail.rating))?;

        if detail.reviews.is_empty() {
            writeln!(self.output, "{rule}\n")?;
            writeln!(self.output, "This place doesn't have any reviews yet.")?;
            return Ok(true);
        }

        writeln!(self.output, "\nAnalyzing reviews...")?;
        self.output.flush()?;
        if let Some(analysis) = analyze_reviews(self.analyst, &detail.name, &detail.reviews).await {
            writeln!(
                self.output,
                "\nAI RECOMMENDATION FOR {} ({}/5)",
                detail.name,
                rating_display(detail.rating)
            )?;
            writeln!(self.output, "{}", "-".repeat(20))?;
            writeln!(self.output, "{analysis}")?;
        }
        writeln!(self.output, "{rule}\n")?;

        let Some(answer) = self.prompt("Would you like to see the actual reviews? (y/n): ")? else {
            return Ok(false);
        };
        if is_yes(Some(&answer)) {
            writeln!(self.output, "\nReviews:")?;
            for review in &detail.reviews {
                writeln!(self.output, "\n---")?;
                writeln!(self.output, "Rating: {}/5", review.rating)?;
                writeln!(self.output, "Review: {}", review.text)?;
                writeln!(self.output, "Time: {}", review.relative_time_description)?;
            }
            writeln!(self.output, "\n{rule}\n")?;
        }
        Ok(true)
    }

    fn report_no_results(&mut self, keyword: Option<&str>) -> Result<()> {
        writeln!(self.output, "{}", no_results_message(keyword))?;
        if keyword.is_some() {
            writeln!(self.output, "Try:")?;
            writeln!(self.output, "1. Using a different search term")?;
            writeln!(self.output, "2. Checking the spelling")?;
            writeln!(
                self.output,
                "3. Using a broader search term (e.g., 'mexican' instead of 'cantina')"
            )?;
        }
        Ok(())
    }

    /// Print `message` and read one line. `None` means input is exhausted.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }
}

fn is_yes(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fakes::*;
    use async_trait::async_trait;
    use std::io::{self, Cursor};
    use std::sync::{Arc, Mutex};

    async fn run_session(places: &FakePlaces, analyst: &FakeAnalyst, script: &str) -> String {
        let mut output = Vec::new();
        let mut shell = Shell::new(places, analyst, Cursor::new(script.as_bytes().to_vec()), &mut output);
        shell.run().await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_geocoded_coordinate_reaches_nearby_search_unchanged() {
        let spot = Coordinate::new(40.712776, -74.005974);
        let places = FakePlaces {
            geocoded: Some(spot),
            nearby: vec![business("a", "Luigi's")],
            ..Default::default()
        };
        let analyst = FakeAnalyst::default();

        run_session(&places, &analyst, "2\n10007\npizza\n0\n").await;

        let calls = places.calls();
        assert_eq!(calls[0], Call::Geocode("10007".to_string()));
        assert_eq!(calls[1], Call::Nearby(spot, 5000, Some("pizza".to_string())));
    }

    #[tokio::test]
    async fn test_default_location_skips_geocoding() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's")],
            ..Default::default()
        };
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "\n\n0\n").await;

        assert_eq!(places.calls(), vec![Call::Nearby(DEFAULT_LOCATION, 5000, None)]);
        assert!(out.contains("1. Luigi's - 1 Main St"));
        assert!(out.contains("Rating: 4.5"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_geocode_failure_ends_session() {
        let places = FakePlaces::default();
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "3\nnowhere at all\n").await;

        assert!(out.contains("Could not find coordinates for that address!"));
        assert_eq!(places.calls(), vec![Call::Geocode("nowhere at all".to_string())]);
    }

    #[tokio::test]
    async fn test_no_results_with_keyword_suggests_alternatives() {
        let places = FakePlaces::default();
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "1\ncantina\n").await;

        assert!(out.contains("No nearby results found, trying text search..."));
        assert!(out.contains("No businesses found matching 'cantina'!"));
        assert!(out.contains("Using a broader search term"));
        assert_eq!(
            places.calls(),
            vec![
                Call::Nearby(DEFAULT_LOCATION, 5000, Some("cantina".to_string())),
                Call::Text(Some("cantina".to_string()), Some(DEFAULT_LOCATION)),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_results_without_keyword() {
        let places = FakePlaces::default();
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "1\n\n").await;

        assert!(out.contains("No businesses found!"));
        assert!(!out.contains("Try:"));
    }

    #[tokio::test]
    async fn test_full_session_with_analysis_and_reviews() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's"), business("b", "Bella")],
            details: Some(detail("Luigi's", vec![review(5, "great"), review(3, "ok")])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::replying("Definitely worth a visit.");

        let out = run_session(&places, &analyst, "1\n\n7\nabc\n1\ny\nn\n").await;

        assert!(out.contains("Please enter a number between 0 and 2"));
        assert!(out.contains("Please enter a valid number"));
        assert!(out.contains("Fetching details for Luigi's..."));
        assert!(out.contains("Phone: N/A"));
        assert!(out.contains("AI RECOMMENDATION FOR Luigi's (4.0/5)"));
        assert!(out.contains("Definitely worth a visit."));
        assert!(out.contains("Review: great"));
        assert!(out.contains("Time: 2 weeks ago"));
        assert!(out.ends_with("Goodbye!\n"));
        assert_eq!(places.calls().last(), Some(&Call::Details("a".to_string())));
        assert!(analyst.prompts.lock().unwrap()[0].contains("4.0/5"));
    }

    #[tokio::test]
    async fn test_place_without_reviews() {
        let places = FakePlaces {
            nearby: vec![business("a", "Quiet Cafe")],
            details: Some(detail("Quiet Cafe", vec![])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::replying("unused");

        let out = run_session(&places, &analyst, "1\n\n1\nn\n").await;

        assert!(out.contains("This place doesn't have any reviews yet."));
        assert!(!out.contains("Analyzing reviews..."));
        assert_eq!(analyst.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_details_failure_then_continue() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's")],
            details_status: Some("NOT_FOUND".to_string()),
            ..Default::default()
        };
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "1\n\n1\ny\n0\n").await;

        assert_eq!(out.matches("Sorry, couldn't fetch details for this place.").count(), 1);
        assert_eq!(out.matches("Nearby Businesses:").count(), 2);
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_summary_failure_degrades_display() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's")],
            details: Some(detail("Luigi's", vec![review(4, "fine")])),
            ..Default::default()
        };
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "1\n\n1\nn\nn\n").await;

        assert!(out.contains("Analyzing reviews..."));
        assert!(!out.contains("AI RECOMMENDATION"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_invalid_location_choice_reprompts_and_eof_exits() {
        let places = FakePlaces::default();
        let analyst = FakeAnalyst::default();

        let out = run_session(&places, &analyst, "9\n").await;

        assert!(out.contains("Please enter 1, 2, or 3"));
        assert!(places.calls().is_empty());
    }

    /// Terminal output that stays readable while the session is running.
    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Remembers what the terminal showed when the model was asked.
    struct WatchingAnalyst {
        output: SharedOutput,
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl CompletionProvider for WatchingAnalyst {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            *self.seen.lock().unwrap() = Some(self.output.text());
            Ok("Go early, it fills up.".to_string())
        }
    }

    #[tokio::test]
    async fn test_progress_message_precedes_review_analysis() {
        let places = FakePlaces {
            nearby: vec![business("a", "Luigi's")],
            details: Some(detail("Luigi's", vec![review(5, "great")])),
            ..Default::default()
        };
        let output = SharedOutput::default();
        let analyst = WatchingAnalyst {
            output: output.clone(),
            seen: Mutex::new(None),
        };

        let mut shell = Shell::new(&places, &analyst, Cursor::new(b"1\n\n1\nn\nn\n".to_vec()), output.clone());
        shell.run().await.unwrap();

        let seen = analyst.seen.lock().unwrap().clone().unwrap();
        assert!(seen.ends_with("Analyzing reviews...\n"));
        assert!(!seen.contains("AI RECOMMENDATION"));
        assert!(output.text().contains("Go early, it fills up."));
    }
}
