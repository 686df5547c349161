use allocsync::db::Database;
use allocsync::models::*;
use chrono::NaiveDate;
use speculate2::speculate;

fn create_test_user(db: &Database, username: &str) -> User {
    db.create_user(CreateUserInput {
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: format!("{}@hpc.example.edu", username),
        active: true,
    })
    .expect("Failed to create user")
}

fn create_test_project(db: &Database, title: &str, owner_id: uuid::Uuid) -> Project {
    db.create_project(CreateProjectInput {
        title: title.to_string(),
        owner_id,
        description: "enter description".to_string(),
        status: ProjectStatus::Active,
        review_required: false,
    })
    .expect("Failed to create project")
}

fn create_test_allocation(db: &Database, project_id: uuid::Uuid) -> Allocation {
    db.create_allocation(CreateAllocationInput {
        project_id,
        status: AllocationStatus::Active,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    })
    .expect("Failed to create allocation")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "users" {
        it "creates and finds a user by username" {
            let created = create_test_user(&db, "alice");

            let found = db.get_user_by_username("alice").expect("Query failed");
            assert!(found.is_some());
            let found = found.unwrap();
            assert_eq!(found.id, created.id);
            assert_eq!(found.email, "alice@hpc.example.edu");
            assert!(found.active);
        }

        it "returns None for an unknown username" {
            let found = db.get_user_by_username("ghost").expect("Query failed");
            assert!(found.is_none());
        }

        it "rejects a duplicate username" {
            create_test_user(&db, "alice");
            let dup = db.create_user(CreateUserInput {
                username: "alice".to_string(),
                first_name: "Other".to_string(),
                last_name: "Alice".to_string(),
                email: "alice2@hpc.example.edu".to_string(),
                active: true,
            });
            assert!(dup.is_err());
        }

        it "lists all users ordered by username" {
            create_test_user(&db, "zoe");
            create_test_user(&db, "alice");

            let users = db.get_all_users().expect("Query failed");
            assert_eq!(users.len(), 2);
            assert_eq!(users[0].username, "alice");
            assert_eq!(users[1].username, "zoe");
        }

        it "toggles the active flag without touching the record otherwise" {
            let user = create_test_user(&db, "alice");

            db.set_user_active(user.id, false).expect("Update failed");
            let found = db.get_user_by_username("alice").expect("Query failed").unwrap();
            assert!(!found.active);
            assert_eq!(found.email, user.email);

            db.set_user_active(user.id, true).expect("Update failed");
            let found = db.get_user_by_username("alice").expect("Query failed").unwrap();
            assert!(found.active);
        }
    }

    describe "projects" {
        it "creates and finds a project by title" {
            let owner = create_test_user(&db, "bob");
            let created = create_test_project(&db, "P1", owner.id);

            let found = db.get_project_by_title("P1").expect("Query failed").unwrap();
            assert_eq!(found.id, created.id);
            assert_eq!(found.owner_id, owner.id);
            assert_eq!(found.status, ProjectStatus::Active);
            assert!(!found.review_required);
        }

        it "overwrites the sync-managed fields in one write" {
            let owner = create_test_user(&db, "bob");
            let project = create_test_project(&db, "P1", owner.id);

            db.update_project_sync_state(project.id, ProjectStatus::Active, true, "enter description")
                .expect("Update failed");

            let found = db.get_project_by_title("P1").expect("Query failed").unwrap();
            assert!(found.review_required);
            assert_eq!(found.description, "enter description");
        }

        it "archives and revives via status" {
            let owner = create_test_user(&db, "bob");
            let project = create_test_project(&db, "P1", owner.id);

            db.set_project_status(project.id, ProjectStatus::Archived).expect("Update failed");
            let found = db.get_project_by_title("P1").expect("Query failed").unwrap();
            assert_eq!(found.status, ProjectStatus::Archived);

            db.set_project_status(project.id, ProjectStatus::Active).expect("Update failed");
            let found = db.get_project_by_title("P1").expect("Query failed").unwrap();
            assert_eq!(found.status, ProjectStatus::Active);
        }
    }

    describe "memberships" {
        it "creates and finds a membership by its identity pair" {
            let owner = create_test_user(&db, "bob");
            let member = create_test_user(&db, "alice");
            let project = create_test_project(&db, "P1", owner.id);

            let created = db.create_membership(CreateMembershipInput {
                project_id: project.id,
                user_id: member.id,
                role: MembershipRole::User,
                status: MembershipStatus::Active,
            }).expect("Failed to create membership");

            let found = db.get_membership(project.id, member.id).expect("Query failed").unwrap();
            assert_eq!(found.id, created.id);
            assert_eq!(found.role, MembershipRole::User);
            assert_eq!(found.status, MembershipStatus::Active);
        }

        it "updates role and status together" {
            let owner = create_test_user(&db, "bob");
            let member = create_test_user(&db, "alice");
            let project = create_test_project(&db, "P1", owner.id);

            let membership = db.create_membership(CreateMembershipInput {
                project_id: project.id,
                user_id: member.id,
                role: MembershipRole::User,
                status: MembershipStatus::Removed,
            }).expect("Failed to create membership");

            db.update_membership(membership.id, MembershipRole::Manager, MembershipStatus::Active)
                .expect("Update failed");

            let found = db.get_membership(project.id, member.id).expect("Query failed").unwrap();
            assert_eq!(found.role, MembershipRole::Manager);
            assert_eq!(found.status, MembershipStatus::Active);
        }

        it "rejects a second membership for the same pair" {
            let owner = create_test_user(&db, "bob");
            let member = create_test_user(&db, "alice");
            let project = create_test_project(&db, "P1", owner.id);

            db.create_membership(CreateMembershipInput {
                project_id: project.id,
                user_id: member.id,
                role: MembershipRole::User,
                status: MembershipStatus::Active,
            }).expect("Failed to create membership");

            let dup = db.create_membership(CreateMembershipInput {
                project_id: project.id,
                user_id: member.id,
                role: MembershipRole::Manager,
                status: MembershipStatus::Active,
            });
            assert!(dup.is_err());
        }
    }

    describe "resources" {
        it "creates and finds the resource by name" {
            db.create_resource(CreateResourceInput {
                name: "cluster".to_string(),
                description: "Primary HPC cluster".to_string(),
                is_allocatable: true,
                is_available: true,
                is_public: true,
                requires_payment: false,
            }).expect("Failed to create resource");

            let found = db.get_resource_by_name("cluster").expect("Query failed").unwrap();
            assert_eq!(found.description, "Primary HPC cluster");
            assert!(found.is_allocatable);
            assert!(!found.requires_payment);
        }

        it "returns None for an unknown resource" {
            assert!(db.get_resource_by_name("nope").expect("Query failed").is_none());
        }
    }

    describe "allocations" {
        it "creates one allocation per project and finds it" {
            let owner = create_test_user(&db, "bob");
            let project = create_test_project(&db, "P1", owner.id);
            let allocation = create_test_allocation(&db, project.id);

            let found = db.get_allocation_by_project(project.id).expect("Query failed").unwrap();
            assert_eq!(found.id, allocation.id);
            assert_eq!(found.status, AllocationStatus::Active);
            assert_eq!(found.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        }

        it "attaches the resource exactly once" {
            let owner = create_test_user(&db, "bob");
            let project = create_test_project(&db, "P1", owner.id);
            let allocation = create_test_allocation(&db, project.id);
            let resource = db.create_resource(CreateResourceInput {
                name: "cluster".to_string(),
                description: String::new(),
                is_allocatable: true,
                is_available: true,
                is_public: true,
                requires_payment: false,
            }).expect("Failed to create resource");

            db.attach_allocation_resource(allocation.id, resource.id).expect("Attach failed");
            db.attach_allocation_resource(allocation.id, resource.id).expect("Attach failed");

            let resources = db.get_allocation_resources(allocation.id).expect("Query failed");
            assert_eq!(resources.len(), 1);
            assert_eq!(resources[0].name, "cluster");
        }

        it "expires via status" {
            let owner = create_test_user(&db, "bob");
            let project = create_test_project(&db, "P1", owner.id);
            let allocation = create_test_allocation(&db, project.id);

            db.set_allocation_status(allocation.id, AllocationStatus::Expired).expect("Update failed");

            let found = db.get_allocation_by_project(project.id).expect("Query failed").unwrap();
            assert_eq!(found.status, AllocationStatus::Expired);
        }
    }

    describe "allocation_users" {
        it "creates, finds, and flips status" {
            let owner = create_test_user(&db, "bob");
            let member = create_test_user(&db, "alice");
            let project = create_test_project(&db, "P1", owner.id);
            let allocation = create_test_allocation(&db, project.id);

            let created = db.create_allocation_user(CreateAllocationUserInput {
                allocation_id: allocation.id,
                user_id: member.id,
                status: AllocationUserStatus::Active,
            }).expect("Failed to create allocation user");

            let found = db.get_allocation_user(allocation.id, member.id)
                .expect("Query failed")
                .unwrap();
            assert_eq!(found.id, created.id);

            db.set_allocation_user_status(created.id, AllocationUserStatus::Removed)
                .expect("Update failed");
            let found = db.get_allocation_user(allocation.id, member.id)
                .expect("Query failed")
                .unwrap();
            assert_eq!(found.status, AllocationUserStatus::Removed);
        }
    }
}
