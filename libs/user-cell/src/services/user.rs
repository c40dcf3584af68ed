use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination;

use crate::models::{UserError, UserPage, UserSummary};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const USER_COLUMNS: &str = "id,username,email,full_name,phone_number,date_of_birth,role,created_at";

pub struct UserService {
    supabase: Arc<SupabaseClient>,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn list_users(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<UserPage, UserError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        pagination::validate_bounds(page, page_size).map_err(UserError::InvalidPagination)?;

        let offset = pagination::offset(page, page_size);
        let fetch_path = format!(
            "/rest/v1/users?select={}&order=created_at.asc,id.asc&limit={}&offset={}",
            USER_COLUMNS, page_size, offset
        );
        debug!("Fetching users (offset {}, limit {})", offset, page_size);

        let (users, total) = tokio::try_join!(
            self.supabase.request::<Vec<UserSummary>>(Method::GET, &fetch_path, None),
            self.supabase.count("/rest/v1/users"),
        )
        .map_err(|e| {
            error!("Failed to list users: {}", e);
            UserError::DatabaseError(e.to_string())
        })?;

        let total_pages = pagination::total_pages(total, page_size);
        if u64::from(page) > total_pages && total_pages > 0 {
            warn!("Requested page {} is out of range ({} pages)", page, total_pages);
            return Err(UserError::PageOutOfRange { page, total_pages });
        }

        let (from_item, to_item) = if total == 0 {
            (0, 0)
        } else {
            (offset + 1, (offset + u64::from(page_size)).min(total))
        };

        info!("Fetched {} of {} users (page {})", users.len(), total, page);

        Ok(UserPage {
            page_number: page,
            page_size,
            total_pages,
            from_item,
            to_item,
            total_items: total,
            data: users,
        })
    }
}
