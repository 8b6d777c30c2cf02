use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{Company, Moa, ValidCompany};
use crate::ids::CompanyId;
use crate::storage::{RepositoryError, SqliteStore};

/// Storage abstraction for host training establishments.
pub trait CompanyRepository: Send + Sync {
    fn insert_company(
        &self,
        company: &ValidCompany,
        now: DateTime<Utc>,
    ) -> Result<Company, RepositoryError>;
    fn update_company(
        &self,
        id: CompanyId,
        company: &ValidCompany,
    ) -> Result<Company, RepositoryError>;
    fn set_company_moa(&self, id: CompanyId, moa: Option<Moa>) -> Result<(), RepositoryError>;
    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
    /// True while interns or supervisor accounts still reference the company.
    fn company_in_use(&self, id: CompanyId) -> Result<bool, RepositoryError>;
    fn delete_company(&self, id: CompanyId) -> Result<(), RepositoryError>;
}

const COMPANY_COLUMNS: &str = "id, name, address, industry, contact_person, contact_email, \
     contact_phone, slots, moa_signed_on, moa_expires_on";

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    let signed_on: Option<NaiveDate> = row.get(8)?;
    let expires_on: Option<NaiveDate> = row.get(9)?;
    let moa = match (signed_on, expires_on) {
        (Some(signed_on), Some(expires_on)) => Some(Moa {
            signed_on,
            expires_on,
        }),
        _ => None,
    };

    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        industry: row.get(3)?,
        contact_person: row.get(4)?,
        contact_email: row.get(5)?,
        contact_phone: row.get(6)?,
        slots: row.get(7)?,
        moa,
    })
}

impl CompanyRepository for SqliteStore {
    fn insert_company(
        &self,
        company: &ValidCompany,
        now: DateTime<Utc>,
    ) -> Result<Company, RepositoryError> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO companies (name, address, industry, contact_person, contact_email, \
                 contact_phone, slots, moa_signed_on, moa_expires_on, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    company.name,
                    company.address,
                    company.industry,
                    company.contact_person,
                    company.contact_email,
                    company.contact_phone,
                    company.slots,
                    company.moa.map(|moa| moa.signed_on),
                    company.moa.map(|moa| moa.expires_on),
                    now,
                ],
            )?;
            Ok(CompanyId(conn.last_insert_rowid()))
        })?;

        self.fetch_company(id)?.ok_or(RepositoryError::NotFound)
    }

    fn update_company(
        &self,
        id: CompanyId,
        company: &ValidCompany,
    ) -> Result<Company, RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE companies SET name = ?2, address = ?3, industry = ?4, contact_person = ?5, \
                 contact_email = ?6, contact_phone = ?7, slots = ?8, moa_signed_on = ?9, \
                 moa_expires_on = ?10 WHERE id = ?1",
                params![
                    id,
                    company.name,
                    company.address,
                    company.industry,
                    company.contact_person,
                    company.contact_email,
                    company.contact_phone,
                    company.slots,
                    company.moa.map(|moa| moa.signed_on),
                    company.moa.map(|moa| moa.expires_on),
                ],
            )
        })?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.fetch_company(id)?.ok_or(RepositoryError::NotFound)
    }

    fn set_company_moa(&self, id: CompanyId, moa: Option<Moa>) -> Result<(), RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE companies SET moa_signed_on = ?2, moa_expires_on = ?3 WHERE id = ?1",
                params![
                    id,
                    moa.map(|moa| moa.signed_on),
                    moa.map(|moa| moa.expires_on)
                ],
            )
        })?;
        if changed == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
                [id],
                company_from_row,
            )
            .optional()
        })
    }

    fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name COLLATE NOCASE"
            ))?;
            let rows = stmt.query_map([], company_from_row)?;
            rows.collect()
        })
    }

    fn company_in_use(&self, id: CompanyId) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM interns WHERE company_id = ?1)
                     OR EXISTS (SELECT 1 FROM accounts WHERE company_id = ?1)",
                [id],
                |row| row.get(0),
            )
        })
    }

    fn delete_company(&self, id: CompanyId) -> Result<(), RepositoryError> {
        let changed =
            self.with_conn(|conn| conn.execute("DELETE FROM companies WHERE id = ?1", [id]))?;
        if changed == 0 {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }
}
