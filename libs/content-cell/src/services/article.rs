use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Article, ArticleDraft, ArticleStatus, CreateArticleRequest, UpdateArticleRequest,
};

pub struct ArticleService {
    supabase: SupabaseClient,
}

impl ArticleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_article(
        &self,
        request: CreateArticleRequest,
        auth_token: &str,
    ) -> Result<Article> {
        debug!("Creating article: {}", request.slug);

        let existing_path = format!("/rest/v1/articles?slug=eq.{}", request.slug);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(anyhow!("Article with slug {} already exists", request.slug));
        }

        let article_data = json!({
            "title": request.title,
            "slug": request.slug,
            "excerpt": request.excerpt,
            "body_markdown": request.body_markdown,
            "category": request.category,
            "tags": request.tags.unwrap_or_default(),
            "status": request.status.unwrap_or(ArticleStatus::Draft),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/articles",
            Some(auth_token),
            Some(article_data),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to create article"));
        }

        let article: Article = serde_json::from_value(result[0].clone())?;
        debug!("Article created with ID: {}", article.id);

        Ok(article)
    }

    /// Persist the output of a drafting conversation as a draft article.
    /// Slug collisions get a numeric suffix instead of failing the save.
    pub async fn save_draft(
        &self,
        draft: &ArticleDraft,
        auth_token: &str,
    ) -> Result<Article> {
        let mut slug = draft.slug.clone();

        let existing_path = format!("/rest/v1/articles?slug=eq.{}", slug);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            slug = format!("{}-{}", slug, Utc::now().timestamp());
        }

        self.create_article(
            CreateArticleRequest {
                title: draft.title.clone(),
                slug,
                excerpt: Some(draft.excerpt.clone()),
                body_markdown: draft.body_markdown.clone(),
                category: Some(draft.category.clone()),
                tags: Some(draft.tags.clone()),
                status: Some(ArticleStatus::Draft),
            },
            auth_token,
        ).await
    }

    pub async fn get_article(&self, article_id: &str, auth_token: &str) -> Result<Article> {
        let path = format!("/rest/v1/articles?id=eq.{}", article_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Article not found"));
        }

        let article: Article = serde_json::from_value(result[0].clone())?;
        Ok(article)
    }

    pub async fn list_articles(
        &self,
        status: Option<ArticleStatus>,
        auth_token: &str,
    ) -> Result<Vec<Article>> {
        let mut path = "/rest/v1/articles?order=updated_at.desc".to_string();
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", json!(status).as_str().unwrap_or_default()));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let articles: Vec<Article> = result.into_iter()
            .map(|a| serde_json::from_value(a))
            .collect::<std::result::Result<Vec<Article>, _>>()?;

        Ok(articles)
    }

    pub async fn update_article(
        &self,
        article_id: &str,
        request: UpdateArticleRequest,
        auth_token: &str,
    ) -> Result<Article> {
        debug!("Updating article: {}", article_id);

        let mut update_data = serde_json::Map::new();

        if let Some(title) = request.title {
            update_data.insert("title".to_string(), json!(title));
        }
        if let Some(slug) = request.slug {
            update_data.insert("slug".to_string(), json!(slug));
        }
        if let Some(excerpt) = request.excerpt {
            update_data.insert("excerpt".to_string(), json!(excerpt));
        }
        if let Some(body_markdown) = request.body_markdown {
            update_data.insert("body_markdown".to_string(), json!(body_markdown));
        }
        if let Some(category) = request.category {
            update_data.insert("category".to_string(), json!(category));
        }
        if let Some(tags) = request.tags {
            update_data.insert("tags".to_string(), json!(tags));
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/articles?id=eq.{}", article_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(headers),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Failed to update article"));
        }

        let article: Article = serde_json::from_value(result[0].clone())?;
        Ok(article)
    }

    pub async fn delete_article(&self, article_id: &str, auth_token: &str) -> Result<()> {
        debug!("Deleting article: {}", article_id);

        let path = format!("/rest/v1/articles?id=eq.{}", article_id);
        self.supabase.execute(Method::DELETE, &path, Some(auth_token), None).await?;

        Ok(())
    }
}
