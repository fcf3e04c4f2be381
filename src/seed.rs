//! 示例数据：清空文章与点赞后写入一组固定文章，供本地演示和端到端测试使用。

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::convert::Infallible;

use crate::content::slug::generate_slug;
use crate::repository::PostRepository;
use crate::repository::post::PostInput;

struct Sample {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    tags: &'static str,
    date: (i32, u32, u32),
    image: &'static str,
}

const BODY: &str = "# Overview\n\n\
    This is sample content used to exercise listing, navigation and pagination.\n\n\
    ## Details\n\n\
    Each sample post has a category, a few tags and a publication date so that \
    the sidebar aggregates have something to count.\n";

const SAMPLES: &[Sample] = &[
    Sample {
        title: "Shipping a SQLite-backed service",
        description: "Notes on running a small service on a single database file.",
        category: "Databases",
        tags: "Back-End,Databases",
        date: (2022, 4, 18),
        image: "https://images.unsplash.com/photo-1496128858413-b36217c2ce36",
    },
    Sample {
        title: "Faster front ends with fewer requests",
        description: "Bundling, caching headers and what actually moved the numbers.",
        category: "Front End",
        tags: "Front-End,Optimisation",
        date: (2020, 3, 16),
        image: "https://images.unsplash.com/photo-1517694712202-14dd9538aa97",
    },
    Sample {
        title: "Picking a UI framework in 2024",
        description: "A comparison written after rewriting the same page three times.",
        category: "Front End",
        tags: "Front-End,Dev Tools",
        date: (2024, 12, 16),
        image: "https://images.unsplash.com/photo-1461749280684-dccba630e2f6",
    },
    Sample {
        title: "Maintaining a legacy batch system",
        description: "What a decade-old nightly job taught us about observability.",
        category: "Operations",
        tags: "Programming,Mainframes",
        date: (2012, 12, 16),
        image: "https://images.unsplash.com/photo-1518770660439-4636190af475",
    },
    Sample {
        title: "Typed APIs without the ceremony",
        description: "Keeping request and response types honest across a codebase.",
        category: "Languages",
        tags: "Programming,Type Systems,Web Development",
        date: (2025, 2, 12),
        image: "https://images.unsplash.com/photo-1515879218367-8466d910aaa4",
    },
    Sample {
        title: "Lighter pages, smaller footprint",
        description: "Measuring page weight and the energy cost of serving it.",
        category: "Web Design",
        tags: "Sustainability,Performance",
        date: (2025, 3, 5),
        image: "https://images.unsplash.com/photo-1473341304170-971dccb5ac1e",
    },
    Sample {
        title: "Accessible forms from the start",
        description: "Labels, focus order and error messages that screen readers announce.",
        category: "Accessibility",
        tags: "Inclusive Design,UX,HTML",
        date: (2025, 4, 10),
        image: "https://images.unsplash.com/photo-1522542550221-31fd19575a2d",
    },
    Sample {
        title: "When to split a monolith",
        description: "Signals that a service boundary will pay for itself, and signals that it will not.",
        category: "Architecture",
        tags: "Microservices,System Design,Back-End",
        date: (2025, 4, 22),
        image: "https://images.unsplash.com/photo-1558494949-ef010cbdcc31",
    },
    Sample {
        title: "Compiling to WebAssembly",
        description: "Moving a hot loop into the browser and what the profiler said afterwards.",
        category: "Performance",
        tags: "WebAssembly,Optimisation",
        date: (2025, 5, 2),
        image: "https://images.unsplash.com/photo-1555066931-4365d14bab8c",
    },
];

/// 按标题生成互不重复的 url_id，组装成待写入的数据
fn sample_posts() -> Vec<(String, PostInput)> {
    let mut taken: HashSet<String> = HashSet::new();
    SAMPLES
        .iter()
        .map(|s| {
            let url_id = match generate_slug::<_, Infallible>(s.title, None, |c, _| Ok(taken.contains(c))) {
                Ok(url_id) => url_id,
                Err(never) => match never {},
            };
            taken.insert(url_id.clone());

            let date = NaiveDate::from_ymd_opt(s.date.0, s.date.1, s.date.2)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt));

            let input = PostInput {
                title: s.title.to_string(),
                description: s.description.to_string(),
                content: BODY.to_string(),
                image_url: s.image.to_string(),
                tags: s.tags.to_string(),
                category: s.category.to_string(),
                date,
            };
            (url_id, input)
        })
        .collect()
}

pub async fn reseed(posts: &PostRepository) -> Result<usize> {
    let count = posts.replace_all(&sample_posts()).await?;
    tracing::info!("已写入 {} 篇示例文章", count);
    Ok(count)
}
