use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{AFFORDANCE_RADIUS, BUSY_RADIUS, CanvasScene, InfoCard, SceneNode};

const BACKGROUND: &str = "#f4f1ea";
const LINK_COLOR: &str = "#999";
const CARD_WIDTH: f64 = 400.0;

pub(crate) fn render(scene: &CanvasScene, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);
	ctx.save();
	let _ = ctx.translate(scene.transform.x, scene.transform.y);
	let _ = ctx.scale(scene.transform.k, scene.transform.k);
	draw_links(scene, ctx);
	draw_nodes(scene, ctx);
	draw_affordances(scene, ctx);
	draw_busy(scene, ctx);
	if let Some(card) = &scene.card {
		draw_card(card, ctx);
	}
	ctx.restore();
}

fn draw_links(scene: &CanvasScene, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(LINK_COLOR);
	ctx.set_line_width(1.5);
	for path in scene.links.values() {
		let [start, rest @ ..] = path.points();
		ctx.begin_path();
		ctx.move_to(start.x, start.y);
		for p in rest {
			ctx.line_to(p.x, p.y);
		}
		ctx.stroke();
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_nodes(scene: &CanvasScene, ctx: &CanvasRenderingContext2d) {
	let (bw, bh) = (scene.box_width, scene.box_height);
	for node in scene.nodes.values() {
		draw_person_box(node, bw, bh, ctx);
	}
}

fn draw_person_box(node: &SceneNode, bw: f64, bh: f64, ctx: &CanvasRenderingContext2d) {
	let (left, top) = (node.position.x - bw / 2.0, node.position.y - bh / 2.0);
	rounded_rect(ctx, left, top, bw, bh, 5.0);
	ctx.set_fill_style_str("white");
	ctx.fill();
	ctx.set_stroke_style_str(node.stroke);
	ctx.set_line_width(2.0);
	ctx.stroke();

	// long names are clipped to the box
	ctx.save();
	ctx.begin_path();
	ctx.rect(left, top, bw - 8.0, 30.0);
	ctx.clip();
	ctx.set_fill_style_str("#222");
	ctx.set_font("bold 13px sans-serif");
	let _ = ctx.fill_text(&node.name, left + 7.0, node.position.y - 3.0);
	ctx.restore();

	ctx.set_fill_style_str("#555");
	ctx.set_font("11px sans-serif");
	let _ = ctx.fill_text(&node.lifespan, left + 7.0, node.position.y + 13.0);
}

fn draw_affordances(scene: &CanvasScene, ctx: &CanvasRenderingContext2d) {
	let half = AFFORDANCE_RADIUS / 2.0;
	for centre in scene.affordances.values() {
		ctx.begin_path();
		let _ = ctx.arc(centre.x, centre.y, AFFORDANCE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("white");
		ctx.fill();
		ctx.set_stroke_style_str(LINK_COLOR);
		ctx.set_line_width(1.5);
		ctx.stroke();

		ctx.begin_path();
		ctx.move_to(centre.x, centre.y - half);
		ctx.line_to(centre.x, centre.y + half);
		ctx.move_to(centre.x - half, centre.y);
		ctx.line_to(centre.x + half, centre.y);
		ctx.stroke();
	}
}

fn draw_busy(scene: &CanvasScene, ctx: &CanvasRenderingContext2d) {
	let start = (scene.spin_time * 2.0 * PI) % (2.0 * PI);
	ctx.set_stroke_style_str("#333");
	ctx.set_line_width(2.0);
	for centre in scene.busy.values() {
		ctx.begin_path();
		let _ = ctx.arc(centre.x, centre.y, BUSY_RADIUS, start, start + 1.5 * PI);
		ctx.stroke();
	}
}

fn draw_card(card: &InfoCard, ctx: &CanvasRenderingContext2d) {
	let (x, y) = (card.anchor.x, card.anchor.y);
	let height = (50.0 + 18.0 * card.lines.len() as f64).max(130.0);
	rounded_rect(ctx, x, y, CARD_WIDTH, height, 10.0);
	ctx.set_fill_style_str("white");
	ctx.fill();
	ctx.set_stroke_style_str(card.stroke);
	ctx.set_line_width(2.0);
	ctx.stroke();

	ctx.set_fill_style_str("#222");
	ctx.set_font("bold 15px sans-serif");
	let _ = ctx.fill_text(&card.name, x + 15.0, y + 27.0);
	ctx.set_font("12px sans-serif");
	for (i, line) in card.lines.iter().enumerate() {
		let _ = ctx.fill_text_with_max_width(line, x + 15.0, y + 50.0 + 18.0 * i as f64, CARD_WIDTH - 30.0);
	}
}
