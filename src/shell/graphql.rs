use async_graphql::Schema;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use axum::{Extension, Router, response::Html, routing::get};

pub use crate::adapters::inbound::graphql::{MutationRoot, QueryRoot, SubscriptionRoot};
use crate::shell::state::AppState;

pub type AppSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn schema(state: AppState) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(state)
        .finish()
}

pub fn router(schema: AppSchema) -> Router {
    Router::new()
        .route("/gql", get(graphiql).post(graphql))
        .route_service("/gql/ws", GraphQLSubscription::new(schema.clone()))
        .layer(Extension(schema))
}

async fn graphql(Extension(schema): Extension<AppSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    use async_graphql::http::GraphiQLSource;
    Html(
        GraphiQLSource::build()
            .endpoint("/gql")
            .subscription_endpoint("/gql/ws")
            .finish(),
    )
}
