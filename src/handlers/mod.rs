// handlers/mod.rs - Two-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth, with an admin-only subset)
//
pub mod public;    // Tier 1: No authentication required (/, /health, /metrics, register, login)
pub mod protected; // Tier 2: JWT authentication required (/api/pets, /api/users, /api/auth)
pub mod utils;

/*
HANDLER LAYOUT:

src/handlers/
├── mod.rs              ← This file
├── utils.rs            ← Path id parsing shared by record handlers
├── public/
│   ├── system.rs       ← GET /, GET /health, GET /metrics
│   └── auth/
│       ├── register.rs ← POST /api/users/register
│       └── login.rs    ← POST /api/users/login
└── protected/
    ├── auth/           ← POST /api/auth/refresh, GET /api/auth/whoami
    ├── pets/           ← /api/pets, /api/pets/:pet_id
    └── users/          ← /api/users, /api/users/:id, password, role

Handlers stay thin: extract the caller (`AuthUser`), the path id and the body,
call one service method, and wrap the result in `ApiResponse`. Every rule about
who may touch what lives in `services`.
*/
