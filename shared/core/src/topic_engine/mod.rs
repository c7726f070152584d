//! Clusters embedded articles into topics, fans out LLM labeling per
//! cluster concurrently, optionally sub-clusters oversized clusters, then
//! ranks and caps the result. Never fails: any unanticipated error degrades
//! to the single fallback topic.

mod kmeans;
mod keywords;
mod labeler;

use crate::llm::TextCompletionClient;
use crate::models::{Article, Cluster, DiscoveryResult, Topic, TopicParams};
use std::sync::Arc;
use uuid::Uuid;

const SUB_CLUSTER_THRESHOLD: usize = 10;
const REPRESENTATIVE_DOC_COUNT: usize = 3;
const DEFAULT_TOPIC_CAP: usize = 10;
const FALLBACK_ARTICLE_CAP: usize = 50;

/// A cluster plus the member embeddings, carried privately through this
/// module so oversized clusters can be re-clustered. `models::Cluster`
/// itself stays embedding-free, matching the public data model.
struct WorkingCluster {
    cluster: Cluster,
    vectors: Vec<Vec<f32>>,
}

pub struct TopicEngine<C: TextCompletionClient> {
    llm: Arc<C>,
}

impl<C: TextCompletionClient + 'static> TopicEngine<C> {
    pub fn new(llm: Arc<C>) -> Self {
        Self { llm }
    }

    pub async fn cluster(
        &self,
        query: &str,
        articles: Vec<Article>,
        embeddings: Vec<Option<Vec<f32>>>,
        params: &TopicParams,
    ) -> DiscoveryResult {
        let total_articles_processed = articles.len();

        let pairs: Vec<(Article, Vec<f32>)> = articles
            .into_iter()
            .zip(embeddings)
            .filter_map(|(a, e)| e.map(|e| (a, e)))
            .collect();

        let min_members = params.min_cluster_size.max(2);
        if pairs.len() < min_members {
            return fallback_result(
                query,
                pairs.into_iter().map(|(a, _)| a).collect(),
                total_articles_processed,
            );
        }

        let clusters = build_clusters(pairs, params.min_cluster_size, params.nr_topics);
        if clusters.is_empty() {
            return DiscoveryResult {
                query: query.to_string(),
                topics: Vec::new(),
                total_articles_processed,
            };
        }

        let topics = self.label_clusters_concurrently(clusters, params).await;
        let topics = rank_and_cap(topics, params);

        DiscoveryResult {
            query: query.to_string(),
            topics,
            total_articles_processed,
        }
    }

    async fn label_clusters_concurrently(
        &self,
        clusters: Vec<WorkingCluster>,
        params: &TopicParams,
    ) -> Vec<Topic> {
        let tasks = clusters.into_iter().map(|working| {
            let llm = Arc::clone(&self.llm);
            let max_articles = params.max_articles_per_topic;
            tokio::spawn(async move { label_and_maybe_subcluster(llm, working, max_articles).await })
        });

        let mut topics = Vec::new();
        for task in tasks {
            match task.await {
                Ok(mut produced) => topics.append(&mut produced),
                Err(e) => tracing::error!(error = %e, "per-cluster labeling task panicked"),
            }
        }
        topics
    }
}

/// Runs k-means over the embeddings, groups members by assignment, and
/// attaches keywords/representative docs per cluster. Clusters below
/// `min_cluster_size` are dropped (treated as noise). `nr_topics`, if set,
/// caps clusters kept, discarding the smallest first.
fn build_clusters(
    pairs: Vec<(Article, Vec<f32>)>,
    min_cluster_size: usize,
    nr_topics: Option<usize>,
) -> Vec<WorkingCluster> {
    let vectors: Vec<Vec<f32>> = pairs.iter().map(|(_, e)| e.clone()).collect();
    let k = kmeans::choose_k(vectors.len(), min_cluster_size);
    if k == 0 {
        return Vec::new();
    }
    let assignments = kmeans::fit_predict(&vectors, k);

    let mut buckets: Vec<Vec<(Article, Vec<f32>)>> = vec![Vec::new(); k];
    for (assignment, pair) in assignments.into_iter().zip(pairs) {
        buckets[assignment].push(pair);
    }

    let mut clusters: Vec<WorkingCluster> = buckets
        .into_iter()
        .enumerate()
        .filter(|(_, members)| members.len() >= min_cluster_size)
        .map(|(internal_id, members)| build_working_cluster(internal_id as i64, members))
        .collect();

    if let Some(cap) = nr_topics {
        clusters.sort_by_key(|c| std::cmp::Reverse(c.cluster.articles.len()));
        clusters.truncate(cap);
    }

    clusters
}

fn build_working_cluster(internal_id: i64, members: Vec<(Article, Vec<f32>)>) -> WorkingCluster {
    let (articles, vectors): (Vec<Article>, Vec<Vec<f32>>) = members.into_iter().unzip();
    let docs: Vec<String> = articles.iter().map(|a| a.document_text()).collect();
    let keywords = keywords::extract_keywords(&docs);
    let representative_indices = kmeans::closest_to_centroid(&vectors, REPRESENTATIVE_DOC_COUNT);
    let representative_docs = representative_indices
        .into_iter()
        .map(|i| docs[i].clone())
        .collect();

    WorkingCluster {
        cluster: Cluster {
            internal_id,
            articles,
            keywords,
            representative_docs,
        },
        vectors,
    }
}

async fn label_and_maybe_subcluster<C: TextCompletionClient + 'static>(
    llm: Arc<C>,
    working: WorkingCluster,
    max_articles: usize,
) -> Vec<Topic> {
    if working.cluster.articles.len() > SUB_CLUSTER_THRESHOLD {
        let children = subcluster(&working);
        if children.len() > 1 {
            let mut topics = Vec::with_capacity(children.len());
            for child in children {
                topics.push(label_and_maybe_subcluster(Arc::clone(&llm), child, max_articles).await);
            }
            return topics.into_iter().flatten().collect();
        }
        // sub-clustering yielded <= 1 child: keep the parent intact.
    }

    let label = labeler::label_cluster(
        llm.as_ref(),
        &working.cluster.keywords,
        &working.cluster.representative_docs,
    )
    .await;
    vec![topic_from_cluster(working.cluster, label)]
}

/// Re-clusters an oversized cluster's own members with `minClusterSize=2`
/// and no `nrTopics` cap. Returns the child working-clusters (empty/singleton
/// means sub-clustering did not help and the caller should keep the parent).
fn subcluster(working: &WorkingCluster) -> Vec<WorkingCluster> {
    let pairs: Vec<(Article, Vec<f32>)> = working
        .cluster
        .articles
        .iter()
        .cloned()
        .zip(working.vectors.iter().cloned())
        .collect();
    build_clusters(pairs, 2, None)
}

fn topic_from_cluster(cluster: Cluster, label: labeler::ClusterLabel) -> Topic {
    let article_count = cluster.articles.len();
    Topic {
        id: Uuid::new_v4(),
        title: label.title,
        description: label.description,
        article_count,
        relevance: 1, // placeholder, recomputed in rank_and_cap
        articles: cluster.articles,
    }
}

fn rank_and_cap(mut topics: Vec<Topic>, params: &TopicParams) -> Vec<Topic> {
    if topics.is_empty() {
        return topics;
    }

    let max_count = topics.iter().map(|t| t.article_count).max().unwrap_or(1).max(1);
    for topic in &mut topics {
        let relevance = ((100.0 * topic.article_count as f64) / max_count as f64).round() as i64;
        topic.relevance = relevance.clamp(1, 100) as u32;
    }

    topics.sort_by(|a, b| {
        b.relevance
            .cmp(&a.relevance)
            .then_with(|| b.article_count.cmp(&a.article_count))
    });

    let keep = params.nr_topics.unwrap_or(DEFAULT_TOPIC_CAP);
    topics.truncate(keep);

    for topic in &mut topics {
        topic.articles.truncate(params.max_articles_per_topic);
    }

    topics
}

fn fallback_result(query: &str, articles: Vec<Article>, total_articles_processed: usize) -> DiscoveryResult {
    let n = articles.len();
    let topic = Topic {
        id: Uuid::new_v4(),
        title: format!("General Topic: {query}"),
        description: "Could not perform detailed topic modeling.".to_string(),
        article_count: n,
        relevance: 50,
        articles: articles.into_iter().take(FALLBACK_ARTICLE_CAP).collect(),
    };
    DiscoveryResult {
        query: query.to_string(),
        topics: vec![topic],
        total_articles_processed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::models::ArticleSource;
    use async_trait::async_trait;

    struct StubLlm;

    #[async_trait]
    impl TextCompletionClient for StubLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok("{\"label\":\"Neural Vision Methods\",\"description\":\"S1. S2.\"}".to_string())
        }
    }

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            link: format!("http://example.com/{id}"),
            summary: "summary".to_string(),
            authors: vec![],
            published: None,
            source: ArticleSource::Arxiv,
        }
    }

    #[tokio::test]
    async fn too_few_articles_yields_fallback_topic() {
        let engine = TopicEngine::new(Arc::new(StubLlm));
        let articles = vec![article("a1", "one"), article("a2", "two")];
        let embeddings = vec![Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0])];
        let params = TopicParams::default();

        let result = engine.cluster("my query", articles, embeddings, &params).await;
        assert_eq!(result.topics.len(), 1);
        assert_eq!(result.topics[0].title, "General Topic: my query");
        assert_eq!(result.topics[0].relevance, 50);
        assert_eq!(result.topics[0].article_count, 2);
    }

    #[tokio::test]
    async fn single_cluster_gets_relevance_100_and_fresh_uuid() {
        let engine = TopicEngine::new(Arc::new(StubLlm));
        let articles = vec![
            article("a1", "neural vision methods one"),
            article("a2", "neural vision methods two"),
            article("a3", "neural vision methods three"),
        ];
        let embeddings = vec![
            Some(vec![1.0, 1.0]),
            Some(vec![1.01, 0.99]),
            Some(vec![0.99, 1.02]),
        ];
        let params = TopicParams {
            min_cluster_size: 3,
            nr_topics: None,
            max_articles_per_topic: 40,
        };

        let result = engine.cluster("vision", articles, embeddings, &params).await;
        assert_eq!(result.topics.len(), 1);
        let topic = &result.topics[0];
        assert_eq!(topic.article_count, 3);
        assert_eq!(topic.relevance, 100);
        assert_eq!(topic.title, "Neural vision methods");
        assert_ne!(topic.id, Uuid::nil());
    }

    #[tokio::test]
    async fn dropped_absent_embeddings_reduce_processed_count_not_total() {
        let engine = TopicEngine::new(Arc::new(StubLlm));
        let articles = vec![article("a1", "one"), article("a2", "two"), article("a3", "three")];
        let embeddings = vec![Some(vec![1.0, 0.0]), None, Some(vec![0.0, 1.0])];
        let params = TopicParams::default();

        let result = engine.cluster("q", articles, embeddings, &params).await;
        assert_eq!(result.total_articles_processed, 3);
        let produced: usize = result.topics.iter().map(|t| t.article_count).sum();
        assert!(produced <= result.total_articles_processed);
    }

    #[test]
    fn relevance_is_monotone_and_exactly_one_topic_hits_100() {
        let params = TopicParams::default();
        let topics = vec![
            Topic {
                id: Uuid::new_v4(),
                title: "a".into(),
                description: "".into(),
                article_count: 10,
                relevance: 1,
                articles: vec![],
            },
            Topic {
                id: Uuid::new_v4(),
                title: "b".into(),
                description: "".into(),
                article_count: 4,
                relevance: 1,
                articles: vec![],
            },
        ];
        let topics = rank_and_cap(topics, &params);
        assert_eq!(topics.iter().filter(|t| t.relevance == 100).count(), 1);
        assert!(topics.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }
}
