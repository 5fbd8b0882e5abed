use leptos::prelude::*;

use crate::components::career_graph::{
	CareerGraphCanvas, Domain, EntityNode, GraphData, GraphEdge, GraphNode, SkillNode,
};

fn role(
	id: &str,
	label: &str,
	organization: &str,
	color: &str,
	start: (i32, u8),
	end_year: Option<i32>,
) -> GraphNode {
	GraphNode::Entity(EntityNode {
		id: id.into(),
		label: label.into(),
		organization: organization.into(),
		color: color.into(),
		start_year: start.0,
		start_month: start.1,
		end_year,
	})
}

fn skill(id: &str, label: &str, domain: Domain, short_label: Option<&str>) -> GraphNode {
	GraphNode::Skill(SkillNode {
		id: id.into(),
		label: label.into(),
		domain,
		short_label: short_label.map(str::to_string),
	})
}

fn link(source: &str, target: &str, strength: f64) -> GraphEdge {
	GraphEdge {
		source: source.into(),
		target: target.into(),
		strength,
	}
}

/// A nurse-turned-engineer career, used as the demo dataset.
fn sample_career() -> GraphData {
	let nodes = vec![
		role("ward-nurse", "Staff Nurse", "St. Mary's Hospital", "#4e79a7", (2012, 9), Some(2015)),
		role("charge-nurse", "Charge Nurse", "St. Mary's Hospital", "#76b7b2", (2015, 4), Some(2017)),
		role("informatics", "Clinical Informatics Analyst", "Northside Health", "#f28e2b", (2017, 11), Some(2020)),
		role("engineer", "Software Engineer", "CareStack", "#b07aa1", (2020, 8), Some(2023)),
		role("lead", "Engineering Lead", "CareStack", "#ff9da7", (2023, 5), None),
		skill("triage", "Patient Triage", Domain::Clinical, Some("Triage")),
		skill("meds", "Medication Safety", Domain::Clinical, Some("Meds")),
		skill("ehr", "EHR Workflows", Domain::Clinical, Some("EHR")),
		skill("sql", "SQL", Domain::Technical, None),
		skill("hl7", "HL7 / FHIR", Domain::Technical, Some("FHIR")),
		skill("rust", "Rust", Domain::Technical, None),
		skill("web", "Web Frontends", Domain::Technical, Some("Web")),
		skill("rota", "Shift Planning", Domain::Leadership, Some("Rota")),
		skill("mentoring", "Mentoring", Domain::Leadership, None),
		skill("hiring", "Hiring", Domain::Leadership, None),
	];
	let edges = vec![
		link("ward-nurse", "triage", 0.9),
		link("ward-nurse", "meds", 0.8),
		link("charge-nurse", "triage", 0.7),
		link("charge-nurse", "rota", 0.8),
		link("charge-nurse", "mentoring", 0.5),
		link("informatics", "ehr", 0.9),
		link("informatics", "sql", 0.7),
		link("informatics", "hl7", 0.8),
		link("informatics", "meds", 0.3),
		link("engineer", "rust", 0.9),
		link("engineer", "web", 0.7),
		link("engineer", "sql", 0.6),
		link("engineer", "hl7", 0.5),
		link("lead", "mentoring", 0.9),
		link("lead", "hiring", 0.7),
		link("lead", "rust", 0.4),
	];
	GraphData { nodes, edges }
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let sample = sample_career();
	let issues = sample.validate().err().unwrap_or_default();
	let mut skills: Vec<(String, String)> = sample
		.nodes
		.iter()
		.filter_map(GraphNode::as_skill)
		.map(|s| (s.id.clone(), s.label.clone()))
		.collect();
	skills.sort_by(|a, b| a.1.cmp(&b.1));

	let graph_data = Signal::derive(sample_career);
	let highlighted = RwSignal::new(None::<String>);
	let hovered = RwSignal::new(None::<String>);
	let details = RwSignal::new(String::from("Select a role or skill to see details."));

	let label_of = move |id: &str| {
		sample
			.node(id)
			.map(|n| match n {
				GraphNode::Entity(e) => format!("{} at {} ({})", e.label, e.organization, e.year_range()),
				GraphNode::Skill(s) => format!("{} ({})", s.label, s.domain.as_str()),
			})
			.unwrap_or_else(|| id.to_string())
	};
	let (entity_label, skill_label) = (label_of.clone(), label_of);

	view! {
		<div class="career-page">
			<header>
				<h1>"Career Graph"</h1>
				<p class="subtitle">
					"Roles appear newest first. Hover or focus a node to trace it; click to pin."
				</p>
			</header>

			{(!issues.is_empty())
				.then(|| {
					view! {
						<ul class="data-errors">
							{issues
								.into_iter()
								.map(|e| view! { <li>{e.to_string()}</li> })
								.collect_view()}
						</ul>
					}
				})}

			<div class="career-layout">
				<CareerGraphCanvas
					data=graph_data
					container_height=620.0
					highlighted_node_id=highlighted
					on_entity_selected={move |id: String| details.set(entity_label(&id))}
					on_skill_selected={move |id: String| details.set(skill_label(&id))}
					on_hover_changed={move |id: Option<String>| hovered.set(id)}
				/>

				<aside class="skills-list">
					<h2>"Skills"</h2>
					<ul>
						{skills
							.into_iter()
							.map(|(id, label)| {
								let (enter_id, active_id) = (id.clone(), id);
								view! {
									<li
										class:active=move || {
											hovered.with(|h| h.as_deref() == Some(active_id.as_str()))
										}
										on:mouseenter=move |_| highlighted.set(Some(enter_id.clone()))
										on:mouseleave=move |_| highlighted.set(None)
									>
										{label}
									</li>
								}
							})
							.collect_view()}
					</ul>
				</aside>
			</div>

			<p class="details" aria-live="polite">{move || details.get()}</p>
		</div>
	}
}
