use super::ViewContext;
use crate::models::{Description, DescriptionsResult};
use crate::Result;
use lensing_index::PageRequest;

/// One page of event descriptions, newest year first. Paging is left to
/// the index; `more` is false on its last page.
pub async fn descriptions(ctx: ViewContext<'_>, page: usize) -> Result<DescriptionsResult> {
    let request = PageRequest {
        page,
        page_size: ctx.settings.description_page_size,
        sort_field: ctx.settings.year_field.clone(),
        fields: ctx.settings.description_fields.clone(),
    };
    let result = ctx.engine.search_page(ctx.query, &request).await?;

    Ok(DescriptionsResult {
        descriptions: result
            .hits
            .into_iter()
            .map(|doc| Description {
                dbid: doc.id,
                fields: doc.fields,
            })
            .collect(),
        more: !result.is_last_page,
    })
}
