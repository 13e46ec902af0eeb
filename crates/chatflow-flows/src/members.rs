use chatflow_core::{ContactInfo, UserData};
use chatflow_forms::Form;
use chatflow_sessions::{MenuState, PipelineState, SessionContext, State, Transition};

use crate::catalogue::listing;
use crate::publishing::publish_material;
use crate::search::search_menu;
use crate::shared::Shared;

pub const INVALID_OPTION: &str = "Invalid option.";
pub const CONTACT_UPDATED: &str = "Contact information updated.";
pub const NO_COMPANIES: &str = "There are no companies yet.";
pub const NO_COMPANY: &str = "You do not represent any company.";
pub const NO_PUBLICATIONS: &str = "Your company has not published any material yet.";

/// Home of a registered entrepreneur.
pub fn entrepreneur_menu(shared: &Shared) -> State {
    let contact = shared.clone();
    let companies = shared.clone();
    let search = shared.clone();
    MenuState::default()
        .with_error(INVALID_OPTION)
        .command("/profile", "Show your profile", |ctx| {
            Transition::stay().with_notice(profile(&ctx.data))
        })
        .command("/contact", "Update your contact information", move |_| {
            Transition::to(contact_update(&contact, entrepreneur_menu))
        })
        .command("/companies", "List the registered companies", move |_| {
            Transition::stay().with_notice(company_listing(&companies))
        })
        .command("/search", "Search the published materials", move |_| {
            Transition::to(search_menu(&search))
        })
        .into()
}

/// Home of a registered company representative.
pub fn representative_menu(shared: &Shared) -> State {
    let contact = shared.clone();
    let company = shared.clone();
    let publish = shared.clone();
    let publications = shared.clone();
    MenuState::default()
        .with_error(INVALID_OPTION)
        .command("/profile", "Show your profile", |ctx| {
            Transition::stay().with_notice(profile(&ctx.data))
        })
        .command("/contact", "Update your contact information", move |_| {
            Transition::to(contact_update(&contact, representative_menu))
        })
        .command("/company", "Show the company you represent", move |ctx| {
            Transition::stay().with_notice(company_card(&company, ctx))
        })
        .command("/publish", "Publish a material", move |ctx| {
            match publish.companies().company_of(&ctx.id) {
                Some(company) => Transition::to(publish_material(&publish, &company.name)),
                None => Transition::stay().with_notice(NO_COMPANY),
            }
        })
        .command("/publications", "List your company's publications", move |ctx| {
            Transition::stay().with_notice(company_publications(&publications, ctx))
        })
        .into()
}

fn profile(data: &UserData) -> String {
    format!(
        "Name: {}\nRole: {}\nContact: {}",
        data.name, data.role, data.contact
    )
}

fn company_listing(shared: &Shared) -> String {
    let companies = shared.companies().list();
    if companies.is_empty() {
        return NO_COMPANIES.to_string();
    }
    let mut out = String::from("Companies:");
    for c in companies {
        out.push_str(&format!("\n- {} ({} representatives)", c.name, c.members.len()));
    }
    out
}

fn company_card(shared: &Shared, ctx: &SessionContext) -> String {
    let Some(company) = shared.companies().company_of(&ctx.id) else {
        return NO_COMPANY.to_string();
    };
    let names: Vec<String> = shared
        .directory()
        .into_iter()
        .filter(|(id, _)| company.members.contains(id))
        .map(|(id, name)| name.unwrap_or_else(|| id.to_string()))
        .collect();
    format!(
        "{}\nContact: {}\nRepresentatives: {}",
        company.name,
        company.contact,
        names.join(", ")
    )
}

fn company_publications(shared: &Shared, ctx: &SessionContext) -> String {
    let Some(company) = shared.companies().company_of(&ctx.id) else {
        return NO_COMPANY.to_string();
    };
    let published = shared.catalogue().of_company(&company.name);
    listing(&format!("Published by {}:", company.name), &published, NO_PUBLICATIONS)
}

/// Collects a new email and phone, then returns to `home`.
fn contact_update(shared: &Shared, home: fn(&Shared) -> State) -> State {
    let leaves = shared.leaves();
    let form = Form::new(|c: &ContactInfo| {
        if c.email.is_some() && c.phone.is_some() {
            Ok(c.clone())
        } else {
            Err("Some answers are missing.".to_string())
        }
    })
    .field(leaves.email("Please enter your new email."), |c, v| {
        c.email = Some(v)
    })
    .field(leaves.phone("Please enter your new phone number."), |c, v| {
        c.phone = Some(v)
    });

    let done = shared.clone();
    let back = shared.clone();
    PipelineState::from_processor(
        form,
        move |ctx: &mut SessionContext, contact: ContactInfo| {
            ctx.data.contact = contact;
            Transition::to(home(&done)).with_notice(CONTACT_UPDATED)
        },
        move |_: &mut SessionContext| Transition::to(home(&back)),
    )
    .into()
}
