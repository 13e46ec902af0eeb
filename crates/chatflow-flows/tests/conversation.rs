// Whole conversations driven through the dispatcher, one principal at a time.

use std::sync::Arc;

use chatflow_core::config::{ChatflowConfig, DEFAULT_INVALID_INVITATION, DEFAULT_USAGE};
use chatflow_core::PrincipalId;
use chatflow_dispatch::MessageDispatcher;
use chatflow_flows::geo::UNKNOWN_ADDRESS;
use chatflow_flows::publishing::{MATERIAL_EXISTS, PUBLISH_CANCELLED, PUBLISH_HEADER};
use chatflow_flows::registration::{
    DIFFERENT_COMPANY, ENTREPRENEUR_WELCOME, NAME_TAKEN, REGISTRATION_CANCELLED,
    REPRESENTATIVE_WELCOME,
};
use chatflow_flows::search::NO_RESULTS;
use chatflow_flows::{Gazetteer, Services};
use chatflow_forms::leaf::{INVALID_EMAIL, INVALID_PHONE, UNKNOWN_OPTION};
use chatflow_sessions::{Remover, SessionRegistry};

const ENTREPRENEUR_MENU: &str = "What do you want to do?\n        \
    /profile: Show your profile\n        \
    /contact: Update your contact information\n        \
    /companies: List the registered companies\n        \
    /search: Search the published materials";

const REPRESENTATIVE_MENU: &str = "What do you want to do?\n        \
    /profile: Show your profile\n        \
    /contact: Update your contact information\n        \
    /company: Show the company you represent\n        \
    /publish: Publish a material\n        \
    /publications: List your company's publications";

const SEARCH_MENU: &str = "How do you want to search?\n        \
    /category: Search by category\n        \
    /keyword: Search by keyword\n        \
    /zone: Search near an address\n        \
    /back: Back to the main menu";

const PET_LISTING: &str =
    "- PET (Plastics): 120 kg, normal, offered by Acme at Av. 8 de Octubre 2738";

const ADMIN_MENU: &str = "What do you want to do?\n        \
    /invitecompany: Create a company invitation and get its code\n        \
    /removeuser: Remove a user from the platform\n        \
    /users: List the registered users";

struct Platform {
    services: Arc<Services>,
    dispatcher: MessageDispatcher,
}

impl Platform {
    fn new() -> Self {
        Self::with_registry(Arc::new(SessionRegistry::new()))
    }

    fn with_registry(registry: Arc<SessionRegistry>) -> Self {
        let config = ChatflowConfig::default();
        let gazetteer = Gazetteer::new()
            .with_place("Av. 8 de Octubre 2738", -34.8878, -56.1597)
            .with_place("Rambla República de México 5435", -34.9040, -56.0865);
        let services = Services::new(registry, &config.engine, Arc::new(gazetteer));
        services.seed_admins(&["admin".to_string()]);
        let dispatcher = services.dispatcher(config.bootstrap.clone());
        Self {
            services,
            dispatcher,
        }
    }

    fn say(&self, id: &str, text: &str) -> String {
        self.dispatcher.process_message(&PrincipalId::new(id), text)
    }

    fn register_entrepreneur(&self, id: &str, name: &str) -> String {
        self.say(id, "/start -e");
        self.say(id, name);
        self.say(id, &format!("{}@example.com", name.to_lowercase()));
        self.say(id, "099123456")
    }

    fn register_representative(&self, id: &str, name: &str, company: &str) -> String {
        let code = self.invitation_code();
        self.say(id, &format!("/start {code}"));
        self.say(id, name);
        self.say(id, company);
        self.say(id, &format!("{}@example.com", name.to_lowercase()))
    }

    /// Publishes PET for Acme through `id`, who must represent it.
    fn publish_pet(&self, id: &str) -> String {
        self.say(id, "/publish");
        for answer in ["PET", "Plastics", "120", "kg", "Av. 8 de Octubre 2738", "/normal"] {
            self.say(id, answer);
        }
        self.say(id, "recycled");
        self.say(id, "/done");
        self.say(id, "/done")
    }

    fn invitation_code(&self) -> String {
        let reply = self.say("admin", "/invitecompany");
        let first_line = reply.lines().next().unwrap();
        first_line
            .strip_prefix("The new invitation's code is ")
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap()
            .to_string()
    }
}

#[test]
fn entrepreneur_registers_step_by_step() {
    let p = Platform::new();

    assert_eq!(p.say("ana", "hello"), DEFAULT_USAGE);
    assert_eq!(
        p.say("ana", "/start -e"),
        format!("{ENTREPRENEUR_WELCOME}\nPlease enter your name.")
    );
    assert_eq!(p.say("ana", "Ana"), "Please enter your email.");
    assert_eq!(
        p.say("ana", "not-an-email"),
        format!("{INVALID_EMAIL}\nPlease enter your email.")
    );
    assert_eq!(p.say("ana", "ana@example.com"), "Please enter your phone number.");
    assert_eq!(
        p.say("ana", "abc"),
        format!("{INVALID_PHONE}\nPlease enter your phone number.")
    );
    assert_eq!(
        p.say("ana", "099123456"),
        format!("Registration complete.\n{ENTREPRENEUR_MENU}")
    );
    assert_eq!(
        p.say("ana", "/profile"),
        format!(
            "Name: Ana\nRole: entrepreneur\nContact: ana@example.com / 099123456\n{ENTREPRENEUR_MENU}"
        )
    );
    assert_eq!(
        p.say("ana", "/fly"),
        format!("Invalid option.\n{ENTREPRENEUR_MENU}")
    );
}

#[test]
fn taken_name_keeps_user_on_last_step_until_cancelled() {
    let p = Platform::new();
    p.register_entrepreneur("ana", "Ana");

    p.say("impostor", "/start --entrepreneur");
    p.say("impostor", "Ana");
    p.say("impostor", "other@example.com");
    assert_eq!(
        p.say("impostor", "1234"),
        format!("{NAME_TAKEN}\nPlease enter your phone number.")
    );
    // Still on the phone step.
    assert_eq!(
        p.say("impostor", "5678"),
        format!("{NAME_TAKEN}\nPlease enter your phone number.")
    );

    assert_eq!(
        p.say("impostor", "/cancel"),
        format!(
            "{REGISTRATION_CANCELLED}\nYou are not registered yet.\n        \
             /register: Start the registration again"
        )
    );
    assert_eq!(
        p.say("impostor", "/register"),
        format!("{ENTREPRENEUR_WELCOME}\nPlease enter your name.")
    );
    p.say("impostor", "Bea");
    p.say("impostor", "bea@example.com");
    assert_eq!(
        p.say("impostor", "1234"),
        format!("Registration complete.\n{ENTREPRENEUR_MENU}")
    );
    assert!(p.services.registry().get_by_name("Bea").is_some());
}

#[test]
fn invitation_brings_in_a_representative() {
    let p = Platform::new();
    let code = p.invitation_code();

    assert_eq!(
        p.say("carla", &format!("/start {code}")),
        format!("{REPRESENTATIVE_WELCOME}\nPlease enter your name.")
    );
    assert_eq!(p.say("carla", "Carla"), "Please enter your company's name.");
    assert_eq!(p.say("carla", "Acme"), "Please enter your email.");
    assert_eq!(
        p.say("carla", "carla@acme.com"),
        format!("Registration complete. You represent Acme.\n{REPRESENTATIVE_MENU}")
    );
    assert_eq!(
        p.say("carla", "/company"),
        format!("Acme\nContact: carla@acme.com / -\nRepresentatives: Carla\n{REPRESENTATIVE_MENU}")
    );

    // Codes are single use.
    assert_eq!(
        p.say("dario", &format!("/start {code}")),
        DEFAULT_INVALID_INVITATION
    );

    p.register_entrepreneur("ana", "Ana");
    assert_eq!(
        p.say("ana", "/companies"),
        format!("Companies:\n- Acme (1 representatives)\n{ENTREPRENEUR_MENU}")
    );
}

#[test]
fn admin_removes_a_user_and_their_memberships() {
    let p = Platform::new();
    let code = p.invitation_code();
    p.say("carla", &format!("/start {code}"));
    p.say("carla", "Carla");
    p.say("carla", "Acme");
    p.say("carla", "carla@acme.com");

    assert_eq!(
        p.say("admin", "/users"),
        format!("Users:\n        admin: (unregistered)\n        carla: Carla\n{ADMIN_MENU}")
    );

    assert_eq!(p.say("admin", "/removeuser"), "Enter the id of the user to remove.");
    assert_eq!(p.say("admin", "carla"), "Are you sure? (yes/no)");
    assert_eq!(
        p.say("admin", "yes"),
        format!("User carla removed.\n{ADMIN_MENU}")
    );

    assert_eq!(p.say("carla", "/company"), DEFAULT_USAGE);
    let acme = p.services.shared().companies().get("Acme").unwrap();
    assert!(acme.members.is_empty());
    assert!(p.services.registry().get_by_name("Carla").is_none());

    p.say("admin", "/removeuser");
    p.say("admin", "admin");
    assert_eq!(
        p.say("admin", "y"),
        format!("You cannot remove yourself.\n{ADMIN_MENU}")
    );

    p.say("admin", "/removeuser");
    p.say("admin", "ghost");
    assert_eq!(
        p.say("admin", "n"),
        format!("Nothing was removed.\n{ADMIN_MENU}")
    );
}

#[test]
fn contact_update_returns_to_the_menu() {
    let p = Platform::new();
    p.register_entrepreneur("ana", "Ana");

    assert_eq!(p.say("ana", "/contact"), "Please enter your new email.");
    assert_eq!(
        p.say("ana", "ana@new.com"),
        "Please enter your new phone number."
    );
    assert_eq!(
        p.say("ana", "+598 42"),
        format!("Contact information updated.\n{ENTREPRENEUR_MENU}")
    );
    assert!(p
        .say("ana", "/profile")
        .starts_with("Name: Ana\nRole: entrepreneur\nContact: ana@new.com / +598 42\n"));

    // Cancelling goes home without changes.
    p.say("ana", "/contact");
    assert_eq!(p.say("ana", "/stop"), ENTREPRENEUR_MENU);
}

#[test]
fn sessions_resume_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let before = Platform::new();
    before.register_entrepreneur("ana", "Ana");
    before.say("half", "/start -e");
    before.say("half", "Half");
    assert_eq!(before.services.registry().save_sessions(&path).unwrap(), 3);

    let after = Platform::with_registry(Arc::new(SessionRegistry::new()));
    let services = Arc::clone(&after.services);
    let loaded = after
        .services
        .registry()
        .load_sessions(&path, |id, data| services.restore(id, data))
        .unwrap();
    assert_eq!(loaded, 3);

    assert!(after
        .say("ana", "/profile")
        .starts_with("Name: Ana\nRole: entrepreneur"));
    assert_eq!(after.say("admin", "/nope"), format!("Invalid option.\n{ADMIN_MENU}"));
    // Unfinished sign-ups start over.
    assert_eq!(
        after.say("half", "Half"),
        "Please enter your email."
    );

    // The name index came back with the sessions.
    after.say("copy", "/start -e");
    after.say("copy", "Ana");
    after.say("copy", "copy@example.com");
    assert_eq!(
        after.say("copy", "1"),
        format!("{NAME_TAKEN}\nPlease enter your phone number.")
    );
}

#[test]
fn second_representative_confirms_an_existing_company() {
    let p = Platform::new();
    p.register_representative("carla", "Carla", "Acme");

    let code = p.invitation_code();
    p.say("dario", &format!("/start {code}"));
    p.say("dario", "Dario");
    let question = "A company called Acme already exists.\nIs it the company you belong to? (yes/no)";
    assert_eq!(p.say("dario", "Acme"), question);
    assert_eq!(
        p.say("dario", "no"),
        format!("{DIFFERENT_COMPANY}\nPlease enter your company's name.")
    );
    assert_eq!(p.say("dario", "Acme"), question);
    assert_eq!(p.say("dario", "yes"), "Please enter your email.");
    assert_eq!(
        p.say("dario", "dario@acme.com"),
        format!("Registration complete. You represent Acme.\n{REPRESENTATIVE_MENU}")
    );
    assert_eq!(
        p.say("dario", "/company"),
        format!(
            "Acme\nContact: carla@example.com / -\nRepresentatives: Carla, Dario\n{REPRESENTATIVE_MENU}"
        )
    );
}

#[test]
fn representative_publishes_a_material_step_by_step() {
    let p = Platform::new();
    p.register_representative("carla", "Carla", "Acme");

    assert_eq!(
        p.say("carla", "/publish"),
        format!("{PUBLISH_HEADER}\nWhat is the material called?")
    );
    assert_eq!(p.say("carla", "PET"), "Which category does it belong to?");
    assert_eq!(p.say("carla", "Plastics"), "How much is available?");
    assert_eq!(p.say("carla", "120"), "In which unit? (kg, m3, units, ...)");
    assert_eq!(p.say("carla", "kg"), "Where can it be picked up? Send the address.");
    assert_eq!(
        p.say("carla", "Nowhere 1"),
        format!("{UNKNOWN_ADDRESS}\nWhere can it be picked up? Send the address.")
    );
    let kind_prompt = p.say("carla", "av. 8 de octubre 2738");
    assert!(kind_prompt.starts_with("How is the material offered?\n/normal:"));
    assert_eq!(
        p.say("carla", "/weekly"),
        format!("{UNKNOWN_OPTION}\n{kind_prompt}")
    );
    assert_eq!(
        p.say("carla", "/normal"),
        "Enter keywords that describe it, one per message. Send /done when done.\nEnter a keyword."
    );
    assert_eq!(
        p.say("carla", "recycled"),
        "Added (1 so far). Send an empty message or /done to finish.\nEnter a keyword."
    );
    assert_eq!(
        p.say("carla", "/done"),
        "Add the habilitations needed to handle it. Send /done when done.\n\
         Send the link to the habilitation."
    );
    assert_eq!(
        p.say("carla", "https://permits.example.com/7"),
        "Describe what it allows."
    );
    p.say("carla", "Plastic sorting");
    assert_eq!(
        p.say("carla", "/done"),
        format!("Published PET.\n{REPRESENTATIVE_MENU}")
    );

    let published = p.services.shared().catalogue().of_company("Acme");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].keywords, vec!["recycled".to_string()]);
    assert_eq!(published[0].habilitations.len(), 1);
    assert_eq!(
        p.say("carla", "/publications"),
        format!("Published by Acme:\n{PET_LISTING}\n{REPRESENTATIVE_MENU}")
    );

    // Same material twice is refused at the first step.
    p.say("carla", "/publish");
    assert_eq!(
        p.say("carla", "pet"),
        format!("{MATERIAL_EXISTS}\nWhat is the material called?")
    );
    assert_eq!(
        p.say("carla", "/exit"),
        format!("{PUBLISH_CANCELLED}\n{REPRESENTATIVE_MENU}")
    );
    assert_eq!(p.services.shared().catalogue().len(), 1);
}

#[test]
fn entrepreneur_searches_the_catalogue() {
    let p = Platform::new();
    p.register_representative("carla", "Carla", "Acme");
    assert_eq!(
        p.publish_pet("carla"),
        format!("Published PET.\n{REPRESENTATIVE_MENU}")
    );
    p.register_entrepreneur("ana", "Ana");

    assert_eq!(p.say("ana", "/search"), SEARCH_MENU);
    assert_eq!(p.say("ana", "/category"), "Which category are you looking for?");
    assert_eq!(
        p.say("ana", "plastics"),
        format!("Search results:\n{PET_LISTING}\n{ENTREPRENEUR_MENU}")
    );

    p.say("ana", "/search");
    p.say("ana", "/keyword");
    assert_eq!(
        p.say("ana", "rubber"),
        format!("{NO_RESULTS}\n{ENTREPRENEUR_MENU}")
    );

    p.say("ana", "/search");
    assert_eq!(p.say("ana", "/zone"), "Send the address to search around.");
    assert_eq!(
        p.say("ana", "rambla república de méxico 5435"),
        "How far from it, in kilometres?"
    );
    // The two addresses are about 7 km apart.
    assert_eq!(p.say("ana", "5"), format!("{NO_RESULTS}\n{ENTREPRENEUR_MENU}"));
    p.say("ana", "/search");
    p.say("ana", "/zone");
    p.say("ana", "Rambla República de México 5435");
    assert_eq!(
        p.say("ana", "10"),
        format!("Search results:\n{PET_LISTING}\n{ENTREPRENEUR_MENU}")
    );

    // Cancelling a search goes back to the search menu.
    p.say("ana", "/search");
    p.say("ana", "/category");
    assert_eq!(p.say("ana", "/cancel"), SEARCH_MENU);
    assert_eq!(p.say("ana", "/back"), ENTREPRENEUR_MENU);
}

#[test]
fn publishing_needs_a_company() {
    let p = Platform::new();
    p.register_representative("dario", "Dario", "Globex");
    p.services.shared().companies().remove(&PrincipalId::new("dario"));
    assert_eq!(
        p.say("dario", "/publish"),
        format!("You do not represent any company.\n{REPRESENTATIVE_MENU}")
    );
}
