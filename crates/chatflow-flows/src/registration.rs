use chatflow_core::{ContactInfo, Role};
use chatflow_forms::outcome::with_prompt;
use chatflow_forms::{Form, Handler, Leaf, Outcome, Processor};
use chatflow_sessions::{MenuState, PipelineState, SessionContext, State, Transition, WrapperState};
use tracing::{debug, info};

use crate::admin::admin_menu;
use crate::members::{entrepreneur_menu, representative_menu};
use crate::shared::Shared;

pub const NAME_TAKEN: &str = "A user with this name already exists.";
pub const REGISTRATION_COMPLETE: &str = "Registration complete.";
pub const REGISTRATION_CANCELLED: &str = "Registration cancelled.";
pub const ENTREPRENEUR_WELCOME: &str = "Welcome! Let's get you registered as an entrepreneur.";
pub const REPRESENTATIVE_WELCOME: &str =
    "Invitation accepted. Let's get you registered as a company representative.";
pub const DIFFERENT_COMPANY: &str = "Please enter a different company name.";
pub const REGISTRATION_WITHDRAWN: &str = "Your account was removed while registering.";

const INCOMPLETE: &str = "Some answers are missing.";

#[derive(Default)]
struct EntrepreneurDraft {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Default)]
struct RepresentativeDraft {
    name: Option<String>,
    company: Option<String>,
    email: Option<String>,
}

struct Profile {
    name: String,
    contact: ContactInfo,
}

struct Representative {
    profile: Profile,
    company: String,
}

/// Sign-up for principals who used the reserved `/start` token:
/// name, email, phone.
pub fn entrepreneur_signup(shared: &Shared) -> State {
    let leaves = shared.leaves();
    let form = Form::new(|d: &EntrepreneurDraft| match (&d.name, &d.email, &d.phone) {
        (Some(name), Some(email), Some(phone)) => Ok(Profile {
            name: name.clone(),
            contact: ContactInfo {
                email: Some(email.clone()),
                phone: Some(phone.clone()),
            },
        }),
        _ => Err(INCOMPLETE.to_string()),
    })
    .field(leaves.text("Please enter your name."), |d, v| d.name = Some(v))
    .field(leaves.email("Please enter your email."), |d, v| d.email = Some(v))
    .field(leaves.phone("Please enter your phone number."), |d, v| {
        d.phone = Some(v)
    });

    let claims = shared.clone();
    let handler = Handler::new(form, move |ctx: &mut SessionContext, p: &Profile| {
        (!claims.claim_name(&ctx.id, &p.name)).then(|| NAME_TAKEN.to_string())
    });

    let home = shared.clone();
    let retry = shared.clone();
    let pipeline = PipelineState::new(
        handler,
        move |ctx: &mut SessionContext, profile: Profile| {
            info!(principal = %ctx.id, name = %profile.name, "entrepreneur registered");
            ctx.data.name = profile.name;
            ctx.data.contact = profile.contact;
            Transition::to(entrepreneur_menu(&home)).with_notice(REGISTRATION_COMPLETE)
        },
        move |_: &mut SessionContext| {
            Transition::to(unregistered_menu(&retry, Role::Entrepreneur))
                .with_notice(REGISTRATION_CANCELLED)
        },
    );

    WrapperState::new("entrepreneur-signup", pipeline)
        .with_header(ENTREPRENEUR_WELCOME)
        .into()
}

/// Sign-up for principals who redeemed a company invitation:
/// name, company, email. The company is created on first use; naming one
/// that exists asks the user to confirm they belong to it.
pub fn representative_signup(shared: &Shared) -> State {
    let leaves = shared.leaves();
    let form = Form::new(|d: &RepresentativeDraft| match (&d.name, &d.company, &d.email) {
        (Some(name), Some(company), Some(email)) => Ok(Representative {
            profile: Profile {
                name: name.clone(),
                contact: ContactInfo {
                    email: Some(email.clone()),
                    phone: None,
                },
            },
            company: company.clone(),
        }),
        _ => Err(INCOMPLETE.to_string()),
    })
    .field(leaves.text("Please enter your name."), |d, v| d.name = Some(v))
    .field(CompanyPicker::new(shared), |d, v| d.company = Some(v))
    .field(leaves.email("Please enter your email."), |d, v| d.email = Some(v));

    let commit = shared.clone();
    let handler = Handler::new(form, move |ctx: &mut SessionContext, r: &Representative| {
        if !commit.claim_name(&ctx.id, &r.profile.name) {
            return Some(NAME_TAKEN.to_string());
        }
        match commit.join_company(&ctx.id, &r.company, r.profile.contact.clone()) {
            Some(membership) => {
                debug!(principal = %ctx.id, company = %r.company, ?membership, "company membership");
                None
            }
            None => Some(REGISTRATION_WITHDRAWN.to_string()),
        }
    });

    let home = shared.clone();
    let retry = shared.clone();
    let pipeline = PipelineState::new(
        handler,
        move |ctx: &mut SessionContext, r: Representative| {
            info!(principal = %ctx.id, company = %r.company, "representative registered");
            ctx.data.name = r.profile.name;
            ctx.data.contact = r.profile.contact;
            Transition::to(representative_menu(&home)).with_notice(format!(
                "{REGISTRATION_COMPLETE} You represent {}.",
                r.company
            ))
        },
        move |_: &mut SessionContext| {
            Transition::to(unregistered_menu(&retry, Role::Representative))
                .with_notice(REGISTRATION_CANCELLED)
        },
    );

    WrapperState::new("representative-signup", pipeline)
        .with_header(REPRESENTATIVE_WELCOME)
        .into()
}

/// Asks for a company name. A name already in the directory has to be
/// confirmed before it is accepted; declining asks for another name.
struct CompanyPicker {
    shared: Shared,
    name: Leaf<String>,
    confirm: Option<(String, Leaf<bool>)>,
}

impl CompanyPicker {
    fn new(shared: &Shared) -> Self {
        Self {
            shared: shared.clone(),
            name: shared.leaves().text("Please enter your company's name."),
            confirm: None,
        }
    }
}

impl Processor for CompanyPicker {
    type Output = String;

    fn process_input(&mut self, input: &str) -> Outcome<String> {
        match self.confirm.take() {
            None => match self.name.process_input(input) {
                Outcome::Success(name) if self.shared.companies().get(&name).is_some() => {
                    let confirm = self.shared.leaves().yes_no(format!(
                        "A company called {name} already exists.\nIs it the company you belong to? (yes/no)"
                    ));
                    let prompt = confirm.default_response();
                    self.confirm = Some((name, confirm));
                    Outcome::Retry(prompt)
                }
                other => other,
            },
            Some((name, mut confirm)) => match confirm.process_input(input) {
                Outcome::Success(true) => Outcome::Success(name),
                Outcome::Success(false) => {
                    Outcome::Retry(with_prompt(DIFFERENT_COMPANY, &self.name.default_response()))
                }
                Outcome::Retry(message) => {
                    self.confirm = Some((name, confirm));
                    Outcome::Retry(message)
                }
                Outcome::Cancel => Outcome::Cancel,
            },
        }
    }

    fn default_response(&self) -> String {
        match &self.confirm {
            Some((_, confirm)) => confirm.default_response(),
            None => self.name.default_response(),
        }
    }

    fn reset(&mut self) {
        self.confirm = None;
    }
}

/// Where a principal lands after abandoning their sign-up.
pub fn unregistered_menu(shared: &Shared, role: Role) -> State {
    let shared = shared.clone();
    MenuState::new("You are not registered yet.")
        .command("/register", "Start the registration again", move |_| {
            Transition::to(signup_for(&shared, role))
        })
        .into()
}

/// The state a principal of `role` registers through.
pub fn signup_for(shared: &Shared, role: Role) -> State {
    match role {
        Role::Entrepreneur => entrepreneur_signup(shared),
        Role::Representative => representative_signup(shared),
        Role::Admin => admin_menu(shared),
    }
}
