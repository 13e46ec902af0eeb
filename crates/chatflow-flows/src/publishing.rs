//! Publishing a material on behalf of a company.

use std::sync::Arc;

use chatflow_forms::list::FINISH_COMMAND;
use chatflow_forms::{Form, Handler, Leaf, Leaves, Pipe, Processor};
use chatflow_sessions::{PipelineState, SessionContext, State, Transition, WrapperState};
use tracing::info;

use crate::catalogue::{Amount, Catalogue, Habilitation, Publication, PublicationType};
use crate::geo::Location;
use crate::members::representative_menu;
use crate::shared::Shared;

pub const MATERIAL_EXISTS: &str = "Your company already publishes a material with that name.";
pub const NOT_POSITIVE: &str = "The quantity must be greater than zero.";
pub const INVALID_UNIT: &str = "Please enter a unit such as kg, m3 or units.";
pub const PUBLISH_HEADER: &str = "Let's publish a material.";
pub const PUBLISH_CANCELLED: &str = "Publication cancelled.";

const INCOMPLETE: &str = "Some answers are missing.";
const KIND_PROMPT: &str = "How is the material offered?\n\
    /normal: a single batch\n\
    /scheduled: batches at fixed dates\n\
    /continuous: always available";

#[derive(Default)]
struct PublicationDraft {
    material: Option<String>,
    category: Option<String>,
    amount: Option<Amount>,
    location: Option<Location>,
    kind: Option<PublicationType>,
    keywords: Vec<String>,
    habilitations: Vec<Habilitation>,
}

#[derive(Default)]
struct AmountDraft {
    quantity: Option<f64>,
    unit: Option<String>,
}

#[derive(Default)]
struct HabilitationDraft {
    link: Option<String>,
    description: Option<String>,
}

/// Collects a publication for `company` and adds it to the catalogue.
///
/// The material name is checked when typed and again on commit.
pub fn publish_material(shared: &Shared, company: &str) -> State {
    let leaves = shared.leaves();

    let owner = company.to_string();
    let form = Form::new(move |d: &PublicationDraft| {
        match (&d.material, &d.category, &d.amount, &d.location, d.kind) {
            (Some(material), Some(category), Some(amount), Some(location), Some(kind)) => {
                Ok(Publication {
                    company: owner.clone(),
                    material: material.clone(),
                    category: category.clone(),
                    amount: amount.clone(),
                    location: location.clone(),
                    kind,
                    keywords: d.keywords.clone(),
                    habilitations: d.habilitations.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                })
            }
            _ => Err(INCOMPLETE.to_string()),
        }
    })
    .field(material_name(leaves, shared.catalogue(), company), |d, v| {
        d.material = Some(v)
    })
    .field(leaves.text("Which category does it belong to?"), |d, v| {
        d.category = Some(v)
    })
    .field(amount_form(leaves), |d, v| d.amount = Some(v))
    .field(
        leaves.lookup(
            "Where can it be picked up? Send the address.",
            Arc::clone(shared.geocoder()),
        ),
        |d, v| d.location = Some(v),
    )
    .field(leaves.choice(KIND_PROMPT, PublicationType::options()), |d, v| {
        d.kind = Some(v)
    })
    .field(
        leaves.list(
            format!("Enter keywords that describe it, one per message. Send {FINISH_COMMAND} when done."),
            leaves.text("Enter a keyword."),
        ),
        |d, v| d.keywords = v,
    )
    .field(
        leaves.list(
            format!("Add the habilitations needed to handle it. Send {FINISH_COMMAND} when done."),
            habilitation_form(leaves),
        ),
        |d, v| d.habilitations = v,
    );

    let catalogue = Arc::clone(shared.catalogue());
    let handler = Handler::new(form, move |_: &mut SessionContext, p: &Publication| {
        (!catalogue.publish(p.clone())).then(|| MATERIAL_EXISTS.to_string())
    });

    let home = shared.clone();
    let back = shared.clone();
    let pipeline = PipelineState::new(
        handler,
        move |ctx: &mut SessionContext, p: Publication| {
            info!(principal = %ctx.id, company = %p.company, material = %p.material, "publication committed");
            Transition::to(representative_menu(&home)).with_notice(format!("Published {}.", p.material))
        },
        move |_: &mut SessionContext| {
            Transition::to(representative_menu(&back)).with_notice(PUBLISH_CANCELLED)
        },
    );

    WrapperState::new("publish-material", pipeline)
        .with_header(PUBLISH_HEADER)
        .into()
}

fn material_name(
    leaves: &Leaves,
    catalogue: &Arc<Catalogue>,
    company: &str,
) -> Pipe<Leaf<String>, String> {
    let catalogue = Arc::clone(catalogue);
    let company = company.to_string();
    leaves.text("What is the material called?").pipe(move |name| {
        if catalogue.has_material(&company, &name) {
            Err(MATERIAL_EXISTS.to_string())
        } else {
            Ok(name)
        }
    })
}

fn amount_form(leaves: &Leaves) -> Form<AmountDraft, Amount> {
    Form::new(|d: &AmountDraft| match (d.quantity, &d.unit) {
        (Some(quantity), Some(unit)) => Ok(Amount {
            quantity,
            unit: unit.clone(),
        }),
        _ => Err(INCOMPLETE.to_string()),
    })
    .field(
        leaves.unsigned_float("How much is available?").pipe(|q| {
            if q > 0.0 {
                Ok(q)
            } else {
                Err(NOT_POSITIVE.to_string())
            }
        }),
        |d, v| d.quantity = Some(v),
    )
    .field(
        leaves.text("In which unit? (kg, m3, units, ...)").pipe(|unit| {
            if is_unit(&unit) {
                Ok(unit)
            } else {
                Err(INVALID_UNIT.to_string())
            }
        }),
        |d, v| d.unit = Some(v),
    )
}

fn habilitation_form(leaves: &Leaves) -> Form<HabilitationDraft, Habilitation> {
    Form::new(|d: &HabilitationDraft| match (&d.link, &d.description) {
        (Some(link), Some(description)) => Ok(Habilitation {
            link: link.clone(),
            description: description.clone(),
        }),
        _ => Err(INCOMPLETE.to_string()),
    })
    .field(leaves.link("Send the link to the habilitation."), |d, v| {
        d.link = Some(v)
    })
    .field(leaves.text("Describe what it allows."), |d, v| {
        d.description = Some(v)
    })
}

/// A short unit word: letters, digits, `/` and `.`, with at least one letter.
fn is_unit(s: &str) -> bool {
    s.len() <= 16
        && s.chars().any(char::is_alphabetic)
        && s.chars().all(|c| c.is_alphanumeric() || c == '/' || c == '.')
}
