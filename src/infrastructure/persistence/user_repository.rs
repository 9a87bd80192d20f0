//! PostgreSQL implementation of the User Repository

use crate::domain::shared::error::{DomainError, Result};
use crate::domain::user::{Account, AuthUser, NewTransaction, Session, Transaction, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error};

#[derive(FromRow)]
struct UserRow {
    user_id: String,
    phone: String,
    pin: String,
    name: String,
    email: Option<String>,
    address: Option<String>,
    date_of_birth: Option<String>,
    ssn: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, accounts: Vec<String>) -> AuthUser {
        AuthUser {
            user_id: self.user_id,
            phone: self.phone,
            pin: self.pin,
            name: self.name,
            email: self.email.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            date_of_birth: self.date_of_birth.unwrap_or_default(),
            ssn: self.ssn.unwrap_or_default(),
            accounts,
            created_at: self.created_at.timestamp(),
        }
    }
}

#[derive(FromRow)]
struct SessionRow {
    token: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(r: SessionRow) -> Self {
        Session {
            token: r.token,
            user_id: r.user_id,
            created_at: r.created_at.timestamp(),
            expires_at: r.expires_at.timestamp(),
        }
    }
}

#[derive(FromRow)]
struct AccountRow {
    account_id: String,
    user_id: String,
    account_type: String,
    balance: f64,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account {
            account_id: r.account_id,
            user_id: r.user_id,
            account_type: r.account_type,
            balance: r.balance,
            created_at: r.created_at.timestamp(),
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i32,
    account_id: String,
    from_account: Option<String>,
    to_account: Option<String>,
    amount: f64,
    transaction_date: DateTime<Utc>,
    description: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(r: TransactionRow) -> Self {
        Transaction {
            id: r.id as i64,
            account_id: r.account_id,
            from_account: r.from_account,
            to_account: r.to_account,
            amount: r.amount,
            transaction_date: r.transaction_date.timestamp(),
            description: r.description,
        }
    }
}

const USER_COLUMNS: &str = "user_id, phone, pin, name, email, address, \
     date_of_birth::text AS date_of_birth, ssn, created_at";

fn to_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::AlreadyExists(context.to_string());
        }
        if db.is_foreign_key_violation() {
            return DomainError::NotFound(context.to_string());
        }
    }
    error!("Database error ({}): {}", context, e);
    DomainError::Internal(format!("Database error: {}", e))
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user_where(&self, column: &str, value: &str) -> Result<Option<AuthUser>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find user", e))?;

        match row {
            Some(row) => {
                let accounts = self.list_account_ids(&row.user_id).await?;
                Ok(Some(row.into_user(accounts)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &AuthUser) -> Result<()> {
        debug!("Creating user {}", user.user_id);

        sqlx::query(
            r#"
            INSERT INTO users (user_id, phone, pin, name, email, address, date_of_birth, ssn, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULLIF($7, '')::date, $8, $9)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.phone)
        .bind(&user.pin)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.address)
        .bind(&user.date_of_birth)
        .bind(&user.ssn)
        .bind(to_timestamp(user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("user {}", user.phone), e))?;

        Ok(())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<AuthUser>> {
        self.find_user_where("phone", phone).await
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<AuthUser>> {
        self.find_user_where("user_id", user_id).await
    }

    async fn list_users(&self) -> Result<Vec<AuthUser>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list users", e))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let accounts = self.list_account_ids(&row.user_id).await?;
            users.push(row.into_user(accounts));
        }
        Ok(users)
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(to_timestamp(session.created_at))
        .bind(to_timestamp(session.expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("session", e))?;

        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find session", e))?;

        Ok(row.map(Session::from))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete session", e))?;
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= CURRENT_TIMESTAMP")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("purge sessions", e))?;
        Ok(result.rows_affected())
    }

    async fn create_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, user_id, type, balance, created_at)
            VALUES ($1, $2, $3, CAST($4 AS NUMERIC), $5)
            "#,
        )
        .bind(&account.account_id)
        .bind(&account.user_id)
        .bind(&account.account_type)
        .bind(account.balance)
        .bind(to_timestamp(account.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("account {}", account.account_id), e))?;

        Ok(())
    }

    async fn list_account_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            "SELECT account_id FROM accounts WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list accounts", e))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT account_id, user_id, type AS account_type, balance::float8 AS balance, created_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find account", e))?;

        Ok(row.map(Account::from))
    }

    async fn update_balance(&self, account_id: &str, balance: f64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = CAST($1 AS NUMERIC), updated_at = CURRENT_TIMESTAMP
            WHERE account_id = $2
            "#,
        )
        .bind(balance)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update balance", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("account {}", account_id)));
        }
        Ok(())
    }

    async fn record_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (account_id, from_account, to_account, amount, description)
            VALUES ($1, $2, $3, CAST($4 AS NUMERIC), $5)
            RETURNING id, account_id, from_account, to_account, amount::float8 AS amount,
                      transaction_date, description
            "#,
        )
        .bind(&tx.account_id)
        .bind(&tx.from_account)
        .bind(&tx.to_account)
        .bind(tx.amount)
        .bind(&tx.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(&format!("account {}", tx.account_id), e))?;

        Ok(row.into())
    }

    async fn list_transactions(&self, account_id: &str, limit: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, account_id, from_account, to_account, amount::float8 AS amount,
                   transaction_date, description
            FROM transactions
            WHERE account_id = $1
            ORDER BY transaction_date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list transactions", e))?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}
