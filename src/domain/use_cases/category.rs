use std::sync::Arc;

use validator::Validate;

use crate::{
    entities::category::{Category, CategoryInsert, NewCategoryRequest, UpdateCategoryRequest},
    errors::AppError,
    repositories::category::CategoryRepository,
    utils::valid_uuid::valid_uuid,
};

pub struct CategoryHandler<R>
where
    R: CategoryRepository + ?Sized,
{
    pub category_repo: Arc<R>,
}

impl<R> CategoryHandler<R>
where
    R: CategoryRepository + ?Sized,
{
    pub fn new(category_repo: Arc<R>) -> Self {
        CategoryHandler { category_repo }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.list_categories(false).await
    }

    pub async fn list_featured(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.list_categories(true).await
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, AppError> {
        let id = valid_uuid(id)?;
        self.category_repo.get_category(&id).await
    }

    /// Creates a category; the name must be unused.
    pub async fn create_category(&self, request: NewCategoryRequest) -> Result<Category, AppError> {
        request.validate()?;
        let insert = CategoryInsert::from(request);
        self.category_repo.create_category(&insert).await
    }

    /// Applies only the supplied fields. An empty body leaves the category untouched.
    pub async fn update_category(&self, id: &str, request: UpdateCategoryRequest) -> Result<Category, AppError> {
        request.validate()?;
        let id = valid_uuid(id)?;

        if request.is_empty() {
            return self.category_repo.get_category(&id).await;
        }

        let category = self.category_repo.update_category(&id, &request).await?;
        tracing::info!(category_id = %id, "Category updated");
        Ok(category)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let id = valid_uuid(id)?;
        self.category_repo.delete_category(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::category::{MockCategoryRepository, CATEGORY_IN_USE};
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn new_request(name: &str) -> NewCategoryRequest {
        NewCategoryRequest {
            name: name.into(),
            description: "Decentralised finance protocols".into(),
            icon: "coins".into(),
            featured: false,
        }
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_store() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_create_category().never();
        let handler = CategoryHandler::new(Arc::new(repo));

        let mut request = new_request("DeFi");
        request.description = "short".into();

        let err = handler.create_category(request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref fields) if fields[0].field == "description"));
    }

    #[tokio::test]
    async fn create_passes_normalized_insert() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_create_category()
            .withf(|insert| insert.name == "DeFi" && !insert.featured)
            .times(1)
            .returning(|insert| Ok(Category::from_insert(insert)));
        let handler = CategoryHandler::new(Arc::new(repo));

        let created = handler.create_category(new_request("DeFi")).await.unwrap();
        assert_eq!(created.project_count, 0);
    }

    #[tokio::test]
    async fn malformed_id_is_a_bad_request() {
        let handler = CategoryHandler::new(Arc::new(MockCategoryRepository::new()));
        let err = handler.get_category("abc").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn delete_surfaces_in_use_state() {
        let id = Uuid::new_v4();
        let mut repo = MockCategoryRepository::new();
        repo.expect_delete_category()
            .with(eq(id))
            .returning(|_| Err(AppError::InvalidState(CATEGORY_IN_USE.into())));
        let handler = CategoryHandler::new(Arc::new(repo));

        let err = handler.delete_category(&id.to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn empty_update_reads_current_row() {
        let id = Uuid::new_v4();
        let mut repo = MockCategoryRepository::new();
        repo.expect_update_category().never();
        repo.expect_get_category()
            .with(eq(id))
            .returning(|_| {
                Ok(Category::from_insert(&CategoryInsert {
                    name: "NFT".into(),
                    description: "Collectibles and art".into(),
                    icon: "image".into(),
                    featured: true,
                }))
            });
        let handler = CategoryHandler::new(Arc::new(repo));

        let category = handler
            .update_category(&id.to_string(), UpdateCategoryRequest::default())
            .await
            .unwrap();
        assert_eq!(category.name, "NFT");
    }
}
