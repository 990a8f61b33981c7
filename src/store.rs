use crate::error::{Error, Result};
use crate::schema::{standups, teams};
use crate::{NewStandupEntry, NewTeam, StandupEntry, Team};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;

/// Where stand-up entries come from.
pub trait EntryStore {
    /// Entries of a team with `start <= created_at < end`, oldest first.
    fn entries_in_range(
        &mut self,
        team_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<StandupEntry>>;

    fn entries_for_team(&mut self, team_id: i32) -> Result<Vec<StandupEntry>>;

    fn team_exists(&mut self, team_id: i32) -> Result<bool>;

    fn create_entry(&mut self, entry: NewStandupEntry) -> Result<StandupEntry>;
}

pub fn establish_connection(database_url: &str) -> Result<SqliteConnection> {
    Ok(SqliteConnection::establish(database_url)?)
}

pub fn init_db(conn: &mut SqliteConnection) -> Result<()> {
    sql_query(
        "CREATE TABLE IF NOT EXISTS teams ( \
         id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
         name TEXT NOT NULL, \
         lead_name TEXT, \
         created_at TIMESTAMP NOT NULL)",
    )
    .execute(conn)?;

    sql_query(
        "CREATE TABLE IF NOT EXISTS standups ( \
         id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
         team_id INTEGER NOT NULL REFERENCES teams(id), \
         user_name TEXT NOT NULL, \
         yesterday TEXT NOT NULL, \
         today TEXT NOT NULL, \
         blockers TEXT, \
         created_at TIMESTAMP NOT NULL)",
    )
    .execute(conn)?;

    sql_query("CREATE INDEX IF NOT EXISTS standups_team_created ON standups (team_id, created_at)")
        .execute(conn)?;

    Ok(())
}

pub fn create_team(conn: &mut SqliteConnection, team: NewTeam) -> Result<Team> {
    conn.transaction(|conn| {
        diesel::insert_into(teams::table).values(&team).execute(conn)?;
        let created = teams::table.order(teams::id.desc()).first::<Team>(conn)?;
        Ok(created)
    })
}

pub fn list_teams(conn: &mut SqliteConnection) -> Result<Vec<Team>> {
    Ok(teams::table.order(teams::id.asc()).load::<Team>(conn)?)
}

pub fn list_entries(conn: &mut SqliteConnection) -> Result<Vec<StandupEntry>> {
    Ok(standups::table
        .order(standups::id.asc())
        .load::<StandupEntry>(conn)?)
}

impl EntryStore for SqliteConnection {
    fn entries_in_range(
        &mut self,
        team_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<StandupEntry>> {
        Ok(standups::table
            .filter(standups::team_id.eq(team_id))
            .filter(standups::created_at.ge(start))
            .filter(standups::created_at.lt(end))
            .order((standups::created_at.asc(), standups::id.asc()))
            .load::<StandupEntry>(self)?)
    }

    fn entries_for_team(&mut self, team_id: i32) -> Result<Vec<StandupEntry>> {
        Ok(standups::table
            .filter(standups::team_id.eq(team_id))
            .order((standups::created_at.asc(), standups::id.asc()))
            .load::<StandupEntry>(self)?)
    }

    fn team_exists(&mut self, team_id: i32) -> Result<bool> {
        Ok(diesel::select(diesel::dsl::exists(teams::table.find(team_id))).get_result(self)?)
    }

    fn create_entry(&mut self, entry: NewStandupEntry) -> Result<StandupEntry> {
        self.transaction(|conn| {
            if !conn.team_exists(entry.team_id)? {
                return Err(Error::TeamNotFound(entry.team_id));
            }
            diesel::insert_into(standups::table)
                .values(&entry)
                .execute(conn)?;
            let created = standups::table
                .order(standups::id.desc())
                .first::<StandupEntry>(conn)?;
            Ok(created)
        })
    }
}

/// Entries and teams kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    teams: Vec<i32>,
    entries: Vec<StandupEntry>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn add_team(&mut self, team_id: i32) {
        if !self.teams.contains(&team_id) {
            self.teams.push(team_id);
        }
    }
}

impl EntryStore for MemoryStore {
    fn entries_in_range(
        &mut self,
        team_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<StandupEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.team_id == team_id && e.created_at >= start && e.created_at < end)
            .cloned()
            .collect())
    }

    fn entries_for_team(&mut self, team_id: i32) -> Result<Vec<StandupEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.team_id == team_id)
            .cloned()
            .collect())
    }

    fn team_exists(&mut self, team_id: i32) -> Result<bool> {
        Ok(self.teams.contains(&team_id))
    }

    fn create_entry(&mut self, entry: NewStandupEntry) -> Result<StandupEntry> {
        if !self.teams.contains(&entry.team_id) {
            return Err(Error::TeamNotFound(entry.team_id));
        }

        let created = StandupEntry {
            id: self.entries.len() as i32 + 1,
            team_id: entry.team_id,
            user_name: entry.user_name,
            yesterday: entry.yesterday,
            today: entry.today,
            blockers: entry.blockers,
            created_at: entry.created_at,
        };
        self.entries.push(created.clone());

        Ok(created)
    }
}
