use allocsync::config::SyncConfig;
use allocsync::db::Database;
use allocsync::manifest::{Manifest, ManifestProject, ManifestUser};
use allocsync::models::*;
use allocsync::sync::run_ingest;
use speculate2::speculate;

fn user(username: &str) -> ManifestUser {
    ManifestUser {
        username: username.to_string(),
        firstname: username.to_string(),
        lastname: "Test".to_string(),
    }
}

fn project(name: &str, owner: &str, users: &[&str], admins: &[&str]) -> ManifestProject {
    ManifestProject {
        name: name.to_string(),
        owner: owner.to_string(),
        users: users.iter().map(|s| s.to_string()).collect(),
        admins: admins.iter().map(|s| s.to_string()).collect(),
    }
}

/// A small but representative manifest: one owner, one plain member, one
/// admin member, one project.
fn sample_manifest() -> Manifest {
    Manifest {
        users: vec![user("bob"), user("alice"), user("carol")],
        projects: vec![project("physics", "bob", &["alice", "carol"], &["carol"])],
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let config = SyncConfig::default();
    }

    describe "initial ingest" {
        it "creates every record the manifest implies" {
            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");

            assert_eq!(report.users.created, 3);
            assert_eq!(report.projects.created, 1);
            assert_eq!(report.memberships.created, 2);
            assert_eq!(report.resources.created, 1);
            assert_eq!(report.allocations.created, 1);
            assert_eq!(report.allocation_users.created, 2);

            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            assert_eq!(alice.email, "alice@hpc.example.edu");
            assert!(alice.active);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            assert_eq!(physics.status, ProjectStatus::Active);
            assert_eq!(physics.description, "enter description");

            let allocation = db.get_allocation_by_project(physics.id).unwrap().unwrap();
            assert_eq!(allocation.status, AllocationStatus::Active);
            assert_eq!(allocation.start_date, config.allocation_start);
            assert_eq!(allocation.end_date, config.allocation_end);

            let resources = db.get_allocation_resources(allocation.id).unwrap();
            assert_eq!(resources.len(), 1);
            assert_eq!(resources[0].name, "cluster");
        }

        it "flags existing projects for review on the next cycle" {
            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            assert!(!physics.review_required);

            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.projects.updated, 1);
            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            assert!(physics.review_required);
        }

        it "converges: a third run with the same manifest writes nothing" {
            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");

            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.total_changes(), 0);
        }

        it "assigns the Manager role to admins and User to the rest" {
            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            let carol = db.get_user_by_username("carol").unwrap().unwrap();

            let alice_m = db.get_membership(physics.id, alice.id).unwrap().unwrap();
            assert_eq!(alice_m.role, MembershipRole::User);
            let carol_m = db.get_membership(physics.id, carol.id).unwrap().unwrap();
            assert_eq!(carol_m.role, MembershipRole::Manager);
        }
    }

    describe "owner handling" {
        it "never creates membership or allocation rows for the owner" {
            let manifest = Manifest {
                users: vec![user("bob"), user("alice")],
                // Owner redundantly listed among the members
                projects: vec![project("physics", "bob", &["bob", "alice"], &["bob"])],
            };
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");

            assert_eq!(report.memberships.created, 1);
            assert_eq!(report.allocation_users.created, 1);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            let bob = db.get_user_by_username("bob").unwrap().unwrap();
            assert_eq!(physics.owner_id, bob.id);
            assert!(db.get_membership(physics.id, bob.id).unwrap().is_none());

            let allocation = db.get_allocation_by_project(physics.id).unwrap().unwrap();
            assert!(db.get_allocation_user(allocation.id, bob.id).unwrap().is_none());
        }

        it "fails the projects pass when the owner is unknown" {
            let manifest = Manifest {
                users: vec![user("alice")],
                projects: vec![project("physics", "nobody", &["alice"], &[])],
            };
            let err = run_ingest(&db, &config, &manifest).unwrap_err();
            assert_eq!(err.pass, "projects");
            assert!(err.to_string().contains("owner nobody"));
        }

        it "tolerates duplicate member entries" {
            let manifest = Manifest {
                users: vec![user("bob"), user("alice")],
                projects: vec![project("physics", "bob", &["alice", "alice"], &[])],
            };
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.memberships.created, 1);
            assert_eq!(report.allocation_users.created, 1);
        }
    }

    describe "retirement" {
        before {
            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
        }

        it "deactivates users dropped from the manifest but keeps their rows" {
            let manifest = Manifest {
                users: vec![user("bob"), user("carol")],
                projects: vec![project("physics", "bob", &["carol"], &["carol"])],
            };
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.users.retired, 1);

            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            assert!(!alice.active);

            // Already inactive: a further run does not retire again
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.users.retired, 0);
        }

        it "never deactivates the bootstrap account" {
            let admin = db.create_user(CreateUserInput {
                username: "admin".to_string(),
                first_name: "Site".to_string(),
                last_name: "Admin".to_string(),
                email: "admin@hpc.example.edu".to_string(),
                active: true,
            }).expect("Failed to create admin");

            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");

            let found = db.get_user_by_username("admin").unwrap().unwrap();
            assert_eq!(found.id, admin.id);
            assert!(found.active);
        }

        it "reactivates a user who reappears in the manifest" {
            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            db.set_user_active(alice.id, false).unwrap();

            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.users.updated, 1);
            assert!(db.get_user_by_username("alice").unwrap().unwrap().active);
        }

        it "removes memberships and allocation users for a dropped member" {
            let manifest = Manifest {
                users: vec![user("bob"), user("alice"), user("carol")],
                projects: vec![project("physics", "bob", &["carol"], &["carol"])],
            };
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.memberships.retired, 1);
            assert_eq!(report.allocation_users.retired, 1);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            let alice = db.get_user_by_username("alice").unwrap().unwrap();

            let membership = db.get_membership(physics.id, alice.id).unwrap().unwrap();
            assert_eq!(membership.status, MembershipStatus::Removed);

            let allocation = db.get_allocation_by_project(physics.id).unwrap().unwrap();
            let au = db.get_allocation_user(allocation.id, alice.id).unwrap().unwrap();
            assert_eq!(au.status, AllocationUserStatus::Removed);

            // The user record itself is untouched by membership removal
            assert!(alice.active);
        }

        it "restores a removed membership when the member returns" {
            let without_alice = Manifest {
                users: vec![user("bob"), user("alice"), user("carol")],
                projects: vec![project("physics", "bob", &["carol"], &["carol"])],
            };
            run_ingest(&db, &config, &without_alice).expect("Ingest failed");

            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.memberships.updated, 1);
            assert_eq!(report.allocation_users.updated, 1);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            let membership = db.get_membership(physics.id, alice.id).unwrap().unwrap();
            assert_eq!(membership.status, MembershipStatus::Active);
        }

        it "realigns the role when a member is promoted to admin" {
            let promoted = Manifest {
                users: vec![user("bob"), user("alice"), user("carol")],
                projects: vec![project("physics", "bob", &["alice", "carol"], &["alice", "carol"])],
            };
            let report = run_ingest(&db, &config, &promoted).expect("Ingest failed");
            assert_eq!(report.memberships.updated, 1);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            let alice = db.get_user_by_username("alice").unwrap().unwrap();
            let membership = db.get_membership(physics.id, alice.id).unwrap().unwrap();
            assert_eq!(membership.role, MembershipRole::Manager);
        }

        it "archives dropped projects and expires their allocations" {
            let manifest = Manifest {
                users: vec![user("bob"), user("alice"), user("carol")],
                projects: vec![],
            };
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.projects.retired, 1);
            assert_eq!(report.allocations.retired, 1);

            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            assert_eq!(physics.status, ProjectStatus::Archived);
            let allocation = db.get_allocation_by_project(physics.id).unwrap().unwrap();
            assert_eq!(allocation.status, AllocationStatus::Expired);

            // Already retired: a further run counts nothing
            let report = run_ingest(&db, &config, &manifest).expect("Ingest failed");
            assert_eq!(report.projects.retired, 0);
            assert_eq!(report.allocations.retired, 0);
        }

        it "revives an archived project that reappears" {
            let empty = Manifest {
                users: vec![user("bob"), user("alice"), user("carol")],
                projects: vec![],
            };
            run_ingest(&db, &config, &empty).expect("Ingest failed");

            run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            let physics = db.get_project_by_title("physics").unwrap().unwrap();
            assert_eq!(physics.status, ProjectStatus::Active);
        }
    }

    describe "resource" {
        it "creates the resource once and reuses it afterwards" {
            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.resources.created, 1);

            let report = run_ingest(&db, &config, &sample_manifest()).expect("Ingest failed");
            assert_eq!(report.resources.created, 0);

            let resource = db.get_resource_by_name("cluster").unwrap().unwrap();
            assert!(resource.is_allocatable);
            assert!(resource.is_available);
            assert!(resource.is_public);
            assert!(!resource.requires_payment);
        }
    }
}
