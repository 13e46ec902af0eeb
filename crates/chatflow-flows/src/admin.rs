use chatflow_core::PrincipalId;
use chatflow_forms::Form;
use chatflow_sessions::{MenuState, PipelineState, SessionContext, State, Transition};
use tracing::info;

use crate::invitations::InvitationKind;
use crate::members::INVALID_OPTION;
use crate::shared::Shared;

pub const NOTHING_REMOVED: &str = "Nothing was removed.";
pub const CANNOT_REMOVE_SELF: &str = "You cannot remove yourself.";

/// Home of an administrator.
pub fn admin_menu(shared: &Shared) -> State {
    let invite = shared.clone();
    let remove = shared.clone();
    let users = shared.clone();
    MenuState::default()
        .with_error(INVALID_OPTION)
        .command(
            "/invitecompany",
            "Create a company invitation and get its code",
            move |ctx| {
                let code = invite.invitations().create(InvitationKind::Company, &ctx.id);
                Transition::stay().with_notice(format!("The new invitation's code is {code}."))
            },
        )
        .command("/removeuser", "Remove a user from the platform", move |_| {
            Transition::to(remove_user(&remove))
        })
        .command("/users", "List the registered users", move |_| {
            Transition::stay().with_notice(user_listing(&users))
        })
        .into()
}

fn user_listing(shared: &Shared) -> String {
    let mut out = String::from("Users:");
    for (id, name) in shared.directory() {
        let name = name.unwrap_or_else(|| "(unregistered)".to_string());
        out.push_str(&format!("\n        {id}: {name}"));
    }
    out
}

#[derive(Default)]
struct Removal {
    id: Option<String>,
    confirmed: Option<bool>,
}

fn remove_user(shared: &Shared) -> State {
    let leaves = shared.leaves();
    let form = Form::new(|r: &Removal| match (&r.id, r.confirmed) {
        (Some(id), Some(confirmed)) => Ok((PrincipalId::new(id.clone()), confirmed)),
        _ => Err("Some answers are missing.".to_string()),
    })
    .field(leaves.text("Enter the id of the user to remove."), |r, v| {
        r.id = Some(v)
    })
    .field(leaves.yes_no("Are you sure? (yes/no)"), |r, v| {
        r.confirmed = Some(v)
    });

    let done = shared.clone();
    let back = shared.clone();
    PipelineState::from_processor(
        form,
        move |ctx: &mut SessionContext, (id, confirmed): (PrincipalId, bool)| {
            let notice = if !confirmed {
                NOTHING_REMOVED.to_string()
            } else if id == ctx.id {
                CANNOT_REMOVE_SELF.to_string()
            } else if done.remove_user(&id) {
                info!(admin = %ctx.id, removed = %id, "user removed");
                format!("User {id} removed.")
            } else {
                format!("There is no user with id {id}.")
            };
            Transition::to(admin_menu(&done)).with_notice(notice)
        },
        move |_: &mut SessionContext| Transition::to(admin_menu(&back)),
    )
    .into()
}
