mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::*;

/// Handle to the resource-management store.
///
/// All reconciliation reads and writes go through here. Lookups return
/// `Ok(None)` for a missing record so "not found" is never conflated with a
/// store failure.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "allocsync")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("allocsync.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    pub fn get_all_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, first_name, last_name, email, active, created_at, updated_at
             FROM users ORDER BY username",
        )?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, first_name, last_name, email, active, created_at, updated_at
             FROM users WHERE username = ?",
        )?;

        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            Ok(Some(user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_user(&self, input: CreateUserInput) -> Result<User> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (id, username, first_name, last_name, email, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.username,
                &input.first_name,
                &input.last_name,
                &input.email,
                if input.active { 1 } else { 0 },
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(User {
            id,
            username: input.username,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            active: input.active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_user_active(&self, id: Uuid, active: bool) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE users SET active = ?, updated_at = ? WHERE id = ?",
            (
                if active { 1 } else { 0 },
                Utc::now().to_rfc3339(),
                id.to_string(),
            ),
        )?;
        Ok(())
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, title, owner_id, description, status, review_required, created_at, updated_at
             FROM projects ORDER BY title",
        )?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project_by_title(&self, title: &str) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, title, owner_id, description, status, review_required, created_at, updated_at
             FROM projects WHERE title = ?",
        )?;

        let mut rows = stmt.query([title])?;
        if let Some(row) = rows.next()? {
            Ok(Some(project_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO projects (id, title, owner_id, description, status, review_required, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                input.owner_id.to_string(),
                &input.description,
                input.status.as_str(),
                if input.review_required { 1 } else { 0 },
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id,
            title: input.title,
            owner_id: input.owner_id,
            description: input.description,
            status: input.status,
            review_required: input.review_required,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite the sync-managed fields of a project in one write.
    pub fn update_project_sync_state(
        &self,
        id: Uuid,
        status: ProjectStatus,
        review_required: bool,
        description: &str,
    ) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE projects SET status = ?, review_required = ?, description = ?, updated_at = ? WHERE id = ?",
            (
                status.as_str(),
                if review_required { 1 } else { 0 },
                description,
                Utc::now().to_rfc3339(),
                id.to_string(),
            ),
        )?;
        Ok(())
    }

    pub fn set_project_status(&self, id: Uuid, status: ProjectStatus) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE projects SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(())
    }

    // ============================================================
    // Membership operations
    // ============================================================

    pub fn get_all_memberships(&self) -> Result<Vec<Membership>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, user_id, role, status, created_at, updated_at
             FROM memberships ORDER BY created_at",
        )?;

        let memberships = stmt
            .query_map([], membership_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(memberships)
    }

    pub fn get_membership(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<Membership>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, user_id, role, status, created_at, updated_at
             FROM memberships WHERE project_id = ? AND user_id = ?",
        )?;

        let mut rows = stmt.query([project_id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(membership_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_membership(&self, input: CreateMembershipInput) -> Result<Membership> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO memberships (id, project_id, user_id, role, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.project_id.to_string(),
                input.user_id.to_string(),
                input.role.as_str(),
                input.status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Membership {
            id,
            project_id: input.project_id,
            user_id: input.user_id,
            role: input.role,
            status: input.status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_membership(
        &self,
        id: Uuid,
        role: MembershipRole,
        status: MembershipStatus,
    ) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE memberships SET role = ?, status = ?, updated_at = ? WHERE id = ?",
            (
                role.as_str(),
                status.as_str(),
                Utc::now().to_rfc3339(),
                id.to_string(),
            ),
        )?;
        Ok(())
    }

    pub fn set_membership_status(&self, id: Uuid, status: MembershipStatus) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE memberships SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(())
    }

    // ============================================================
    // Resource operations
    // ============================================================

    pub fn get_resource_by_name(&self, name: &str) -> Result<Option<Resource>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_allocatable, is_available, is_public, requires_payment, created_at
             FROM resources WHERE name = ?",
        )?;

        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(resource_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_resource(&self, input: CreateResourceInput) -> Result<Resource> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO resources (id, name, description, is_allocatable, is_available, is_public, requires_payment, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                if input.is_allocatable { 1 } else { 0 },
                if input.is_available { 1 } else { 0 },
                if input.is_public { 1 } else { 0 },
                if input.requires_payment { 1 } else { 0 },
                now.to_rfc3339(),
            ),
        )?;

        Ok(Resource {
            id,
            name: input.name,
            description: input.description,
            is_allocatable: input.is_allocatable,
            is_available: input.is_available,
            is_public: input.is_public,
            requires_payment: input.requires_payment,
            created_at: now,
        })
    }

    // ============================================================
    // Allocation operations
    // ============================================================

    pub fn get_all_allocations(&self) -> Result<Vec<Allocation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, status, start_date, end_date, created_at, updated_at
             FROM allocations ORDER BY created_at",
        )?;

        let allocations = stmt
            .query_map([], allocation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(allocations)
    }

    pub fn get_allocation_by_project(&self, project_id: Uuid) -> Result<Option<Allocation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, status, start_date, end_date, created_at, updated_at
             FROM allocations WHERE project_id = ?",
        )?;

        let mut rows = stmt.query([project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(allocation_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_allocation(&self, input: CreateAllocationInput) -> Result<Allocation> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO allocations (id, project_id, status, start_date, end_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.project_id.to_string(),
                input.status.as_str(),
                input.start_date.to_string(),
                input.end_date.to_string(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Allocation {
            id,
            project_id: input.project_id,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_allocation_status(&self, id: Uuid, status: AllocationStatus) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE allocations SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(())
    }

    pub fn attach_allocation_resource(&self, allocation_id: Uuid, resource_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO allocation_resources (allocation_id, resource_id) VALUES (?, ?)",
            (allocation_id.to_string(), resource_id.to_string()),
        )?;
        Ok(())
    }

    pub fn get_allocation_resources(&self, allocation_id: Uuid) -> Result<Vec<Resource>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT r.id, r.name, r.description, r.is_allocatable, r.is_available, r.is_public, r.requires_payment, r.created_at
             FROM resources r
             JOIN allocation_resources ar ON ar.resource_id = r.id
             WHERE ar.allocation_id = ? ORDER BY r.name",
        )?;

        let resources = stmt
            .query_map([allocation_id.to_string()], resource_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(resources)
    }

    // ============================================================
    // Allocation user operations
    // ============================================================

    pub fn get_all_allocation_users(&self) -> Result<Vec<AllocationUser>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, allocation_id, user_id, status, created_at, updated_at
             FROM allocation_users ORDER BY created_at",
        )?;

        let allocation_users = stmt
            .query_map([], allocation_user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(allocation_users)
    }

    pub fn get_allocation_user(
        &self,
        allocation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<AllocationUser>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, allocation_id, user_id, status, created_at, updated_at
             FROM allocation_users WHERE allocation_id = ? AND user_id = ?",
        )?;

        let mut rows = stmt.query([allocation_id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(allocation_user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_allocation_user(
        &self,
        input: CreateAllocationUserInput,
    ) -> Result<AllocationUser> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO allocation_users (id, allocation_id, user_id, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.allocation_id.to_string(),
                input.user_id.to_string(),
                input.status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(AllocationUser {
            id,
            allocation_id: input.allocation_id,
            user_id: input.user_id,
            status: input.status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_allocation_user_status(&self, id: Uuid, status: AllocationUserStatus) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "UPDATE allocation_users SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(row.get::<_, String>(0)?),
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        active: row.get::<_, i32>(5)? != 0,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        owner_id: parse_uuid(row.get::<_, String>(2)?),
        description: row.get(3)?,
        status: ProjectStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(ProjectStatus::Active),
        review_required: row.get::<_, i32>(5)? != 0,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn membership_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        user_id: parse_uuid(row.get::<_, String>(2)?),
        role: MembershipRole::from_str(&row.get::<_, String>(3)?).unwrap_or(MembershipRole::User),
        status: MembershipStatus::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(MembershipStatus::Active),
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn resource_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        is_allocatable: row.get::<_, i32>(3)? != 0,
        is_available: row.get::<_, i32>(4)? != 0,
        is_public: row.get::<_, i32>(5)? != 0,
        requires_payment: row.get::<_, i32>(6)? != 0,
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn allocation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Allocation> {
    Ok(Allocation {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        status: AllocationStatus::from_str(&row.get::<_, String>(2)?)
            .unwrap_or(AllocationStatus::Active),
        start_date: parse_date(row.get::<_, String>(3)?),
        end_date: parse_date(row.get::<_, String>(4)?),
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn allocation_user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AllocationUser> {
    Ok(AllocationUser {
        id: parse_uuid(row.get::<_, String>(0)?),
        allocation_id: parse_uuid(row.get::<_, String>(1)?),
        user_id: parse_uuid(row.get::<_, String>(2)?),
        status: AllocationUserStatus::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(AllocationUserStatus::Active),
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    s.parse().unwrap_or_default()
}
