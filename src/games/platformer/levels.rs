//! The twenty hand-built dimensions. Units are pixels of an 800×400 field.

use ratatui::style::Color;

use super::{EnemyDef, Level, Motion, PlatformDef, Power};

const fn hex(v: u32) -> Color {
    Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

const fn fixed(x: f32, y: f32, w: f32, h: f32) -> PlatformDef {
    PlatformDef { x, y, w, h, motion: Motion::Fixed }
}

const fn slide_x(x: f32, y: f32, w: f32, h: f32, v: f32, min: f32, max: f32) -> PlatformDef {
    PlatformDef { x, y, w, h, motion: Motion::Horizontal { v, min, max } }
}

const fn slide_y(x: f32, y: f32, w: f32, h: f32, v: f32, min: f32, max: f32) -> PlatformDef {
    PlatformDef { x, y, w, h, motion: Motion::Vertical { v, min, max } }
}

const fn patrol(x: f32, y: f32, vx: f32, min: f32, max: f32) -> EnemyDef {
    EnemyDef { x, y, vx, min, max }
}

pub(super) static LEVELS: [Level; 20] = [
    Level {
        name: "Starter Dimension",
        sky: (hex(0x87CEEB), hex(0xE0F6FF)),
        ground: hex(0x8B4513),
        grass: hex(0x228B22),
        platforms: &[
            fixed(0.0, 350.0, 300.0, 50.0),
            fixed(350.0, 300.0, 150.0, 50.0),
            fixed(550.0, 250.0, 100.0, 50.0),
            fixed(700.0, 300.0, 100.0, 50.0),
        ],
        coins: &[(420.0, 230.0), (600.0, 180.0), (750.0, 230.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(600.0, 200.0, Power::DoubleJump)],
        goal: (750.0, 250.0),
    },
    Level {
        name: "Lava World",
        sky: (hex(0xFF4500), hex(0xFF8C00)),
        ground: hex(0x8B0000),
        grass: hex(0xFF6347),
        platforms: &[
            fixed(0.0, 350.0, 180.0, 50.0),
            fixed(190.0, 300.0, 130.0, 50.0),
            fixed(330.0, 260.0, 120.0, 50.0),
            fixed(460.0, 300.0, 130.0, 50.0),
            fixed(600.0, 250.0, 200.0, 50.0),
        ],
        coins: &[(250.0, 230.0), (390.0, 190.0), (520.0, 230.0), (700.0, 180.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[],
        goal: (750.0, 200.0),
    },
    Level {
        name: "Ice Dimension",
        sky: (hex(0xB0E0E6), hex(0xE6F7FF)),
        ground: hex(0x4682B4),
        grass: hex(0x87CEEB),
        platforms: &[
            fixed(0.0, 350.0, 200.0, 50.0),
            slide_x(250.0, 280.0, 90.0, 30.0, 2.0, 230.0, 360.0),
            fixed(450.0, 250.0, 100.0, 50.0),
            slide_x(600.0, 180.0, 90.0, 30.0, -2.0, 560.0, 680.0),
        ],
        coins: &[(300.0, 210.0), (500.0, 180.0), (640.0, 110.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(500.0, 200.0, Power::Invincible)],
        goal: (640.0, 130.0),
    },
    Level {
        name: "Forest Realm",
        sky: (hex(0x228B22), hex(0x90EE90)),
        ground: hex(0x654321),
        grass: hex(0x00FF00),
        platforms: &[
            fixed(0.0, 350.0, 200.0, 50.0),
            fixed(210.0, 300.0, 140.0, 50.0),
            fixed(360.0, 260.0, 140.0, 50.0),
            fixed(510.0, 300.0, 140.0, 50.0),
            fixed(660.0, 260.0, 140.0, 50.0),
        ],
        coins: &[(280.0, 230.0), (430.0, 190.0), (580.0, 230.0), (730.0, 190.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[],
        goal: (750.0, 210.0),
    },
    Level {
        name: "Night Sky",
        sky: (hex(0x191970), hex(0x483D8B)),
        ground: hex(0x2F4F4F),
        grass: hex(0x4B0082),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            slide_y(200.0, 280.0, 80.0, 30.0, 1.5, 240.0, 320.0),
            fixed(330.0, 250.0, 80.0, 50.0),
            slide_y(460.0, 180.0, 80.0, 30.0, -1.5, 140.0, 220.0),
            fixed(590.0, 200.0, 100.0, 50.0),
            fixed(720.0, 150.0, 80.0, 50.0),
        ],
        coins: &[(240.0, 210.0), (380.0, 180.0), (500.0, 110.0), (640.0, 130.0), (760.0, 80.0)],
        enemies: &[],
        spikes: &[(410.0, 50.0)],
        powerups: &[(380.0, 200.0, Power::DoubleJump)],
        goal: (760.0, 100.0),
    },
    Level {
        name: "Thunder Zone",
        sky: (hex(0x4B0082), hex(0x8B00FF)),
        ground: hex(0x483D8B),
        grass: hex(0x9370DB),
        platforms: &[
            fixed(0.0, 350.0, 200.0, 50.0),
            fixed(250.0, 280.0, 100.0, 50.0),
            fixed(400.0, 220.0, 80.0, 50.0),
            fixed(530.0, 280.0, 100.0, 50.0),
            fixed(680.0, 200.0, 120.0, 50.0),
        ],
        coins: &[(300.0, 210.0), (440.0, 150.0), (580.0, 210.0), (730.0, 130.0)],
        enemies: &[
            patrol(270.0, 250.0, 2.0, 250.0, 330.0),
            patrol(550.0, 250.0, -2.0, 530.0, 610.0),
        ],
        spikes: &[(350.0, 50.0), (480.0, 50.0)],
        powerups: &[],
        goal: (750.0, 150.0),
    },
    Level {
        name: "Desert Sands",
        sky: (hex(0xFFD700), hex(0xFFA500)),
        ground: hex(0xD2691E),
        grass: hex(0xDEB887),
        platforms: &[
            fixed(0.0, 350.0, 180.0, 50.0),
            fixed(230.0, 300.0, 90.0, 50.0),
            fixed(370.0, 260.0, 90.0, 50.0),
            fixed(510.0, 220.0, 90.0, 50.0),
            fixed(650.0, 180.0, 150.0, 50.0),
        ],
        coins: &[(280.0, 230.0), (420.0, 190.0), (560.0, 150.0), (720.0, 110.0)],
        enemies: &[
            patrol(250.0, 270.0, 1.5, 230.0, 300.0),
        ],
        spikes: &[],
        powerups: &[(560.0, 170.0, Power::Invincible)],
        goal: (750.0, 130.0),
    },
    Level {
        name: "Ocean Depths",
        sky: (hex(0x00CED1), hex(0x20B2AA)),
        ground: hex(0x008B8B),
        grass: hex(0x00FFFF),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            slide_x(200.0, 280.0, 100.0, 30.0, 1.5, 180.0, 320.0),
            fixed(370.0, 240.0, 100.0, 50.0),
            slide_x(520.0, 280.0, 100.0, 30.0, -1.5, 480.0, 620.0),
            fixed(680.0, 200.0, 120.0, 50.0),
        ],
        coins: &[(250.0, 210.0), (420.0, 170.0), (570.0, 210.0), (730.0, 130.0)],
        enemies: &[],
        spikes: &[(320.0, 50.0)],
        powerups: &[(420.0, 190.0, Power::DoubleJump)],
        goal: (750.0, 150.0),
    },
    Level {
        name: "Volcano Core",
        sky: (hex(0x8B0000), hex(0xDC143C)),
        ground: hex(0x2F0000),
        grass: hex(0xFF0000),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            fixed(200.0, 290.0, 80.0, 50.0),
            fixed(330.0, 240.0, 80.0, 50.0),
            fixed(460.0, 290.0, 80.0, 50.0),
            fixed(590.0, 240.0, 80.0, 50.0),
            fixed(720.0, 190.0, 80.0, 50.0),
        ],
        coins: &[(240.0, 220.0), (370.0, 170.0), (500.0, 220.0), (630.0, 170.0), (760.0, 120.0)],
        enemies: &[
            patrol(220.0, 260.0, 1.8, 200.0, 260.0),
            patrol(480.0, 260.0, -1.8, 460.0, 520.0),
        ],
        spikes: &[(280.0, 50.0), (410.0, 50.0), (540.0, 50.0)],
        powerups: &[],
        goal: (760.0, 140.0),
    },
    Level {
        name: "Cloud Kingdom",
        sky: (hex(0x87CEEB), hex(0xB0E0E6)),
        ground: hex(0xF0F8FF),
        grass: hex(0xE6E6FA),
        platforms: &[
            fixed(0.0, 350.0, 180.0, 50.0),
            slide_y(230.0, 270.0, 100.0, 30.0, 2.0, 220.0, 310.0),
            fixed(380.0, 220.0, 100.0, 50.0),
            slide_y(530.0, 270.0, 100.0, 30.0, -2.0, 220.0, 310.0),
            fixed(680.0, 180.0, 120.0, 50.0),
        ],
        coins: &[(280.0, 200.0), (430.0, 150.0), (580.0, 200.0), (730.0, 110.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(430.0, 170.0, Power::Invincible)],
        goal: (750.0, 130.0),
    },
    Level {
        name: "Sakura Garden",
        sky: (hex(0xFFB6C1), hex(0xFFC0CB)),
        ground: hex(0x8B4513),
        grass: hex(0xFF69B4),
        platforms: &[
            fixed(0.0, 350.0, 200.0, 50.0),
            fixed(250.0, 290.0, 100.0, 50.0),
            fixed(400.0, 240.0, 100.0, 50.0),
            fixed(550.0, 290.0, 100.0, 50.0),
            fixed(700.0, 230.0, 100.0, 50.0),
        ],
        coins: &[(300.0, 220.0), (450.0, 170.0), (600.0, 220.0), (750.0, 160.0)],
        enemies: &[
            patrol(270.0, 260.0, 1.5, 250.0, 330.0),
        ],
        spikes: &[],
        powerups: &[(450.0, 190.0, Power::DoubleJump)],
        goal: (750.0, 180.0),
    },
    Level {
        name: "Space Station",
        sky: (hex(0x000428), hex(0x004E92)),
        ground: hex(0x708090),
        grass: hex(0x778899),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            slide_x(200.0, 280.0, 90.0, 30.0, 2.0, 180.0, 330.0),
            fixed(380.0, 230.0, 80.0, 50.0),
            slide_x(510.0, 180.0, 90.0, 30.0, -2.0, 470.0, 600.0),
            fixed(660.0, 250.0, 140.0, 50.0),
        ],
        coins: &[(250.0, 210.0), (420.0, 160.0), (560.0, 110.0), (730.0, 180.0)],
        enemies: &[],
        spikes: &[(330.0, 50.0)],
        powerups: &[],
        goal: (750.0, 200.0),
    },
    Level {
        name: "Haunted Graveyard",
        sky: (hex(0x2C003E), hex(0x4A0E4E)),
        ground: hex(0x3D2817),
        grass: hex(0x5A3E2B),
        platforms: &[
            fixed(0.0, 350.0, 170.0, 50.0),
            fixed(220.0, 300.0, 100.0, 50.0),
            fixed(370.0, 250.0, 100.0, 50.0),
            fixed(520.0, 300.0, 100.0, 50.0),
            fixed(670.0, 240.0, 130.0, 50.0),
        ],
        coins: &[(270.0, 230.0), (420.0, 180.0), (570.0, 230.0), (730.0, 170.0)],
        enemies: &[
            patrol(240.0, 270.0, 1.8, 220.0, 300.0),
            patrol(540.0, 270.0, -1.8, 520.0, 600.0),
        ],
        spikes: &[(320.0, 50.0), (470.0, 50.0)],
        powerups: &[(420.0, 200.0, Power::Invincible)],
        goal: (750.0, 190.0),
    },
    Level {
        name: "Rainbow Bridge",
        sky: (hex(0xFF1493), hex(0xFFD700)),
        ground: hex(0xFF6347),
        grass: hex(0x00CED1),
        platforms: &[
            fixed(0.0, 350.0, 180.0, 50.0),
            slide_y(230.0, 280.0, 90.0, 30.0, 2.0, 230.0, 320.0),
            fixed(370.0, 250.0, 100.0, 50.0),
            slide_y(520.0, 280.0, 90.0, 30.0, -2.0, 230.0, 320.0),
            fixed(660.0, 210.0, 140.0, 50.0),
        ],
        coins: &[(280.0, 210.0), (420.0, 180.0), (570.0, 210.0), (730.0, 140.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(420.0, 200.0, Power::DoubleJump)],
        goal: (750.0, 160.0),
    },
    Level {
        name: "Castle Ruins",
        sky: (hex(0x696969), hex(0xA9A9A9)),
        ground: hex(0x696969),
        grass: hex(0x808080),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            fixed(200.0, 290.0, 100.0, 50.0),
            fixed(350.0, 230.0, 100.0, 50.0),
            fixed(500.0, 290.0, 100.0, 50.0),
            fixed(650.0, 230.0, 100.0, 50.0),
        ],
        coins: &[(250.0, 220.0), (400.0, 160.0), (550.0, 220.0), (700.0, 160.0)],
        enemies: &[
            patrol(220.0, 260.0, 2.0, 200.0, 280.0),
            patrol(520.0, 260.0, -2.0, 500.0, 580.0),
        ],
        spikes: &[(300.0, 50.0), (450.0, 50.0), (600.0, 50.0)],
        powerups: &[],
        goal: (700.0, 180.0),
    },
    Level {
        name: "Mushroom Forest",
        sky: (hex(0x9370DB), hex(0xDDA0DD)),
        ground: hex(0x8B4513),
        grass: hex(0xFF1493),
        platforms: &[
            fixed(0.0, 350.0, 200.0, 50.0),
            slide_x(250.0, 280.0, 100.0, 30.0, 1.5, 230.0, 370.0),
            fixed(420.0, 240.0, 100.0, 50.0),
            slide_x(570.0, 280.0, 100.0, 30.0, -1.5, 530.0, 670.0),
            fixed(720.0, 200.0, 80.0, 50.0),
        ],
        coins: &[(300.0, 210.0), (470.0, 170.0), (620.0, 210.0), (760.0, 130.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(470.0, 190.0, Power::Invincible)],
        goal: (760.0, 150.0),
    },
    Level {
        name: "Crystal Cavern",
        sky: (hex(0x4B0082), hex(0x8A2BE2)),
        ground: hex(0x483D8B),
        grass: hex(0x9932CC),
        platforms: &[
            fixed(0.0, 350.0, 160.0, 50.0),
            fixed(210.0, 290.0, 90.0, 50.0),
            fixed(350.0, 240.0, 90.0, 50.0),
            fixed(490.0, 190.0, 90.0, 50.0),
            fixed(630.0, 240.0, 90.0, 50.0),
            fixed(750.0, 180.0, 50.0, 50.0),
        ],
        coins: &[(260.0, 220.0), (400.0, 170.0), (540.0, 120.0), (680.0, 170.0)],
        enemies: &[
            patrol(230.0, 260.0, 1.5, 210.0, 280.0),
        ],
        spikes: &[(300.0, 50.0), (440.0, 50.0)],
        powerups: &[(540.0, 140.0, Power::DoubleJump)],
        goal: (775.0, 130.0),
    },
    Level {
        name: "Snowy Peaks",
        sky: (hex(0xE0FFFF), hex(0xF0FFFF)),
        ground: hex(0xFFFFFF),
        grass: hex(0xB0E0E6),
        platforms: &[
            fixed(0.0, 350.0, 170.0, 50.0),
            slide_y(220.0, 290.0, 100.0, 30.0, 1.5, 250.0, 330.0),
            fixed(370.0, 250.0, 100.0, 50.0),
            slide_y(520.0, 190.0, 100.0, 30.0, -1.5, 150.0, 230.0),
            fixed(670.0, 220.0, 130.0, 50.0),
        ],
        coins: &[(270.0, 220.0), (420.0, 180.0), (570.0, 120.0), (730.0, 150.0)],
        enemies: &[],
        spikes: &[],
        powerups: &[(420.0, 200.0, Power::Invincible)],
        goal: (750.0, 170.0),
    },
    Level {
        name: "Neon City",
        sky: (hex(0xFF00FF), hex(0x00FFFF)),
        ground: hex(0xFF1493),
        grass: hex(0x00FF00),
        platforms: &[
            fixed(0.0, 350.0, 150.0, 50.0),
            fixed(200.0, 280.0, 90.0, 50.0),
            fixed(340.0, 220.0, 90.0, 50.0),
            fixed(480.0, 280.0, 90.0, 50.0),
            fixed(620.0, 220.0, 90.0, 50.0),
            fixed(740.0, 160.0, 60.0, 50.0),
        ],
        coins: &[(245.0, 210.0), (385.0, 150.0), (525.0, 210.0), (665.0, 150.0), (770.0, 90.0)],
        enemies: &[
            patrol(220.0, 250.0, 2.0, 200.0, 270.0),
            patrol(500.0, 250.0, -2.0, 480.0, 550.0),
        ],
        spikes: &[(290.0, 50.0), (430.0, 50.0), (570.0, 50.0)],
        powerups: &[],
        goal: (770.0, 110.0),
    },
    Level {
        name: "Final Dimension",
        sky: (hex(0xFFD700), hex(0xFFA500)),
        ground: hex(0xDAA520),
        grass: hex(0xFF8C00),
        platforms: &[
            fixed(0.0, 350.0, 140.0, 50.0),
            slide_x(190.0, 290.0, 80.0, 30.0, 2.0, 170.0, 280.0),
            fixed(320.0, 240.0, 80.0, 50.0),
            slide_y(450.0, 190.0, 80.0, 30.0, 2.0, 150.0, 230.0),
            fixed(580.0, 240.0, 80.0, 50.0),
            fixed(710.0, 180.0, 90.0, 50.0),
        ],
        coins: &[(235.0, 220.0), (370.0, 170.0), (500.0, 120.0), (630.0, 170.0), (755.0, 110.0)],
        enemies: &[
            patrol(210.0, 260.0, 2.0, 190.0, 260.0),
            patrol(470.0, 160.0, 2.0, 450.0, 510.0),
        ],
        spikes: &[(270.0, 50.0), (400.0, 50.0), (530.0, 50.0)],
        powerups: &[(500.0, 140.0, Power::DoubleJump)],
        goal: (755.0, 130.0),
    },
];
