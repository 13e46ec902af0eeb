//! Entrepreneur searches over the published materials.

use std::sync::Arc;

use chatflow_forms::{Form, Processor};
use chatflow_sessions::{MenuState, PipelineState, SessionContext, State, Transition, WrapperState};
use tracing::debug;

use crate::catalogue::{listing, Catalogue, Publication};
use crate::geo::Location;
use crate::members::{entrepreneur_menu, INVALID_OPTION};
use crate::shared::Shared;

pub const NO_RESULTS: &str = "No published material matches your search.";
pub const NOT_POSITIVE_RADIUS: &str = "The distance must be greater than zero.";

type Query = fn(&Catalogue, &str) -> Vec<Publication>;

#[derive(Default)]
struct ZoneDraft {
    center: Option<Location>,
    radius_km: Option<f64>,
}

/// Lets an entrepreneur pick how to search; every search ends back home with
/// the results.
pub fn search_menu(shared: &Shared) -> State {
    let by_category = shared.clone();
    let by_keyword = shared.clone();
    let by_zone = shared.clone();
    let back = shared.clone();
    MenuState::new("How do you want to search?")
        .with_error(INVALID_OPTION)
        .command("/category", "Search by category", move |_| {
            Transition::to(search_by_text(
                &by_category,
                "search-by-category",
                "Which category are you looking for?",
                Catalogue::by_category,
            ))
        })
        .command("/keyword", "Search by keyword", move |_| {
            Transition::to(search_by_text(
                &by_keyword,
                "search-by-keyword",
                "Which keyword are you looking for?",
                Catalogue::by_keyword,
            ))
        })
        .command("/zone", "Search near an address", move |_| {
            Transition::to(search_by_zone(&by_zone))
        })
        .command("/back", "Back to the main menu", move |_| {
            Transition::to(entrepreneur_menu(&back))
        })
        .into()
}

fn search_by_text(shared: &Shared, label: &str, prompt: &str, query: Query) -> State {
    let home = shared.clone();
    let back = shared.clone();
    let pipeline = PipelineState::from_processor(
        shared.leaves().text(prompt),
        move |ctx: &mut SessionContext, text: String| {
            let found = query(home.catalogue(), &text);
            debug!(principal = %ctx.id, query = %text, found = found.len(), "search");
            results(&home, &found)
        },
        move |_: &mut SessionContext| Transition::to(search_menu(&back)),
    );
    WrapperState::new(label, pipeline).into()
}

fn search_by_zone(shared: &Shared) -> State {
    let leaves = shared.leaves();
    let form = Form::new(|d: &ZoneDraft| match (&d.center, d.radius_km) {
        (Some(center), Some(radius)) => Ok((center.clone(), radius)),
        _ => Err("Some answers are missing.".to_string()),
    })
    .field(
        leaves.lookup(
            "Send the address to search around.",
            Arc::clone(shared.geocoder()),
        ),
        |d, v| d.center = Some(v),
    )
    .field(
        leaves.unsigned_float("How far from it, in kilometres?").pipe(|km| {
            if km > 0.0 {
                Ok(km)
            } else {
                Err(NOT_POSITIVE_RADIUS.to_string())
            }
        }),
        |d, v| d.radius_km = Some(v),
    );

    let home = shared.clone();
    let back = shared.clone();
    let pipeline = PipelineState::from_processor(
        form,
        move |ctx: &mut SessionContext, (center, radius): (Location, f64)| {
            let found = home.catalogue().near(&center, radius);
            debug!(principal = %ctx.id, %center, radius, found = found.len(), "zone search");
            results(&home, &found)
        },
        move |_: &mut SessionContext| Transition::to(search_menu(&back)),
    );
    WrapperState::new("search-by-zone", pipeline).into()
}

fn results(shared: &Shared, found: &[Publication]) -> Transition {
    Transition::to(entrepreneur_menu(shared)).with_notice(listing("Search results:", found, NO_RESULTS))
}
