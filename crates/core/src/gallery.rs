//! Page loaders for the game list and the game detail page.

use tracing::{info, warn};

use crate::{
    config::AppConfig,
    igdb::{
        self, extract_localized_name, image_url,
        normalize::{localization_schema, LOCALIZATIONS_FIELD},
        IgdbClient, ImageSize, ImageVariant, Kind, QueryDescription, RawRecord,
        Schema, TokenProvider,
    },
    models::{Artwork, Cover, GameCard, GameDetail},
};

const LIST_FIELDS: [&str; 6] = [
    "id",
    "name",
    "summary",
    "cover.image_id",
    "game_localizations.name",
    "game_localizations.region",
];

const DETAIL_FIELDS: [&str; 3] = [
    "game_localizations.name",
    "game_localizations.region",
    "artworks.image_id",
];

const LIST_SORT: &str = "first_release_date desc";

/// Loads gallery pages through one [`IgdbClient`].
///
/// Localized names are always picked client-side; the upstream query only
/// filters by platform.
#[derive(Clone)]
pub struct Gallery {
    client: IgdbClient,
    region: u32,
    platform: u32,
    list_limit: u32,
    image_base_url: String,
}

impl Gallery {
    /// Exchange credentials for a token and build the client.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let http = config.http_client()?;
        let provider = TokenProvider::new(http.clone(), &config.auth_url, config.credentials());
        let token = provider.fetch_token().await?;
        let client = IgdbClient::new(http, &config.api_base_url, &config.client_id, token)?;
        Ok(Self::new(client, config))
    }

    pub fn new(client: IgdbClient, config: &AppConfig) -> Self {
        Self {
            client,
            region: config.region,
            platform: config.platform,
            list_limit: config.list_limit,
            image_base_url: config.image_base_url.clone(),
        }
    }

    pub fn client(&self) -> &IgdbClient {
        &self.client
    }

    pub fn region(&self) -> u32 {
        self.region
    }

    fn list_query(&self) -> QueryDescription {
        QueryDescription::new()
            .fields(LIST_FIELDS)
            .filter(format!("platforms = ({})", self.platform))
            .limit(self.list_limit)
    }

    /// Newest games on the configured platform.
    ///
    /// Records that fail validation or lack the target localization are
    /// dropped from the list.
    pub async fn list_games(&self) -> igdb::Result<Vec<GameCard>> {
        let query = self.list_query().sort(LIST_SORT);
        let records = self.client.games(&query).await?;
        let cards = self.collect_cards(records);
        info!(count = cards.len(), region = self.region, "Game list loaded");
        Ok(cards)
    }

    /// Free-text search on the configured platform. Same drop policy as
    /// [`Gallery::list_games`].
    pub async fn search_games(&self, text: &str) -> igdb::Result<Vec<GameCard>> {
        // IGDB rejects `sort` combined with `search`.
        let query = self.list_query().search(text.trim());
        let records = self.client.games(&query).await?;
        let cards = self.collect_cards(records);
        info!(count = cards.len(), search = text, "Game search loaded");
        Ok(cards)
    }

    fn collect_cards(&self, records: Vec<RawRecord>) -> Vec<GameCard> {
        let schema = card_schema();
        records
            .into_iter()
            .filter_map(|record| {
                let id = record.get("id").and_then(|value| value.as_u64());
                match to_card(&record, &schema, self.region) {
                    Ok(card) => Some(card),
                    Err(err) => {
                        warn!(?id, %err, "Skipping game");
                        None
                    }
                }
            })
            .collect()
    }

    /// The detail page for `id`; `Ok(None)` when IGDB has no such game.
    ///
    /// Any validation or localization failure aborts the load.
    pub async fn game_detail(&self, id: u64) -> igdb::Result<Option<GameDetail>> {
        let Some(record) = self.client.get_game_by_id(id, &DETAIL_FIELDS).await? else {
            return Ok(None);
        };

        let validated = detail_schema().validate(&record)?;
        let detail: GameDetail = extract_localized_name(validated, self.region)?.into_view()?;
        info!(id, artworks = detail.artworks.len(), "Game detail loaded");
        Ok(Some(detail))
    }

    /// Double-density cover URL used on cards.
    pub fn cover_url(&self, cover: &Cover) -> String {
        image_url(&self.image_base_url, &cover.image_id, ImageSize::CoverBig.retina())
    }

    pub fn artwork_url(&self, artwork: &Artwork) -> String {
        image_url(&self.image_base_url, &artwork.image_id, ImageVariant::default())
    }
}

fn to_card(record: &RawRecord, schema: &Schema, region: u32) -> igdb::Result<GameCard> {
    let validated = schema.validate(record)?;
    extract_localized_name(validated, region)?.into_view()
}

fn card_schema() -> Schema {
    Schema::new()
        .required("id", Kind::Integer)
        .required("name", Kind::String)
        .optional("summary", Kind::String)
        .optional(
            "cover",
            Kind::Object(
                Schema::new()
                    .optional("id", Kind::Integer)
                    .required("image_id", Kind::String),
            ),
        )
        .required_list(LOCALIZATIONS_FIELD, Kind::Object(localization_schema()))
}

fn detail_schema() -> Schema {
    Schema::new()
        .required("id", Kind::Integer)
        .required_list(LOCALIZATIONS_FIELD, Kind::Object(localization_schema()))
        .optional_list(
            "artworks",
            Kind::Object(
                Schema::new()
                    .required("id", Kind::Integer)
                    .required("image_id", Kind::String),
            ),
        )
}
